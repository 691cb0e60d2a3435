use std::collections::{BTreeMap, VecDeque};

use cpsim_core::{
    format::{
        error::{GenericError, OcppError as FrameError},
        frame::{Call, CallError, CallResult},
        message::EncodeDecode,
    },
    v16::action::Action,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::v16::{
    cp::core::{ChargePointCore, OcppError},
    drivers::{timers::TimerId, ui::UiAdapter},
};

use super::{clock::Instant, session::SessionState};

/// Completed ids remembered so a late or repeated response can be told apart
/// from one that was never requested.
const RESOLVED_HISTORY: usize = 32;

/// Continuation parked with an outstanding Call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CallContext {
    Boot,
    Heartbeat,
    Authorize { connector_id: usize, id_tag: String },
    StatusNotification { connector_id: usize },
    StartTransaction { local_id: u32 },
    StopTransaction { local_id: u32 },
    MeterValues { connector_id: usize },
    DataTransfer { message_id: String },
}

impl CallContext {
    pub fn action(&self) -> Action {
        match self {
            CallContext::Boot => Action::BootNotification,
            CallContext::Heartbeat => Action::Heartbeat,
            CallContext::Authorize { .. } => Action::Authorize,
            CallContext::StatusNotification { .. } => Action::StatusNotification,
            CallContext::StartTransaction { .. } => Action::StartTransaction,
            CallContext::StopTransaction { .. } => Action::StopTransaction,
            CallContext::MeterValues { .. } => Action::MeterValues,
            CallContext::DataTransfer { .. } => Action::DataTransfer,
        }
    }
}

#[derive(Debug)]
pub(crate) struct PendingRequest<S> {
    pub unique_id: String,
    pub action: Action,
    pub sent_at: Instant,
    pub timeout_deadline: Instant,
    pub slot: S,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CorrelationError {
    #[error("unique id `{0}` is already outstanding")]
    DuplicateId(String),
    #[error("response for `{0}` arrived after the request was already resolved")]
    AlreadyResolved(String),
    #[error("response for unknown unique id `{0}`")]
    UnknownId(String),
}

pub(crate) type Resolution<S, E> = (PendingRequest<S>, Result<Value, FrameError<E>>);

/// Outstanding Calls keyed by unique id.
pub(crate) struct CorrelationTable<S> {
    pending: BTreeMap<String, PendingRequest<S>>,
    resolved: VecDeque<String>,
}

impl<S> CorrelationTable<S> {
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            resolved: VecDeque::with_capacity(RESOLVED_HISTORY),
        }
    }

    /// On a duplicate id the slot is handed back untouched.
    pub fn register(
        &mut self,
        unique_id: String,
        action: Action,
        slot: S,
        now: Instant,
        timeout_secs: u64,
    ) -> Result<(), (CorrelationError, S)> {
        if self.pending.contains_key(&unique_id) {
            return Err((CorrelationError::DuplicateId(unique_id), slot));
        }
        self.pending.insert(
            unique_id.clone(),
            PendingRequest {
                unique_id,
                action,
                sent_at: now,
                timeout_deadline: now.add_secs(timeout_secs),
                slot,
            },
        );
        Ok(())
    }

    pub fn contains(&self, unique_id: &str) -> bool {
        self.pending.contains_key(unique_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn on_result<E>(&mut self, result: CallResult) -> Result<Resolution<S, E>, CorrelationError> {
        let request = self.resolve(&result.unique_id)?;
        Ok((request, Ok(result.payload)))
    }

    pub fn on_error<E>(&mut self, error: CallError<E>) -> Result<Resolution<S, E>, CorrelationError> {
        let request = self.resolve(&error.unique_id)?;
        Ok((request, Err(FrameError::Protocol(error.error_code))))
    }

    /// Removes and returns every request whose deadline is not after `now`,
    /// earliest deadline first.
    pub fn sweep_timeouts(&mut self, now: Instant) -> Vec<PendingRequest<S>> {
        let expired: Vec<String> = self
            .pending
            .values()
            .filter(|p| p.timeout_deadline <= now)
            .map(|p| p.unique_id.clone())
            .collect();
        let mut out: Vec<PendingRequest<S>> = expired
            .iter()
            .filter_map(|id| self.resolve(id).ok())
            .collect();
        out.sort_by_key(|p| p.timeout_deadline);
        out
    }

    /// Drains every outstanding request, oldest first.
    pub fn cancel_all(&mut self) -> Vec<PendingRequest<S>> {
        let mut out: Vec<PendingRequest<S>> = core::mem::take(&mut self.pending).into_values().collect();
        out.sort_by_key(|p| p.sent_at);
        for p in &out {
            self.remember(p.unique_id.clone());
        }
        out
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.timeout_deadline).min()
    }

    fn resolve(&mut self, unique_id: &str) -> Result<PendingRequest<S>, CorrelationError> {
        match self.pending.remove(unique_id) {
            Some(request) => {
                self.remember(request.unique_id.clone());
                Ok(request)
            }
            None if self.resolved.iter().any(|id| id == unique_id) => {
                Err(CorrelationError::AlreadyResolved(unique_id.to_string()))
            }
            None => Err(CorrelationError::UnknownId(unique_id.to_string())),
        }
    }

    fn remember(&mut self, unique_id: String) {
        if self.resolved.len() == RESOLVED_HISTORY {
            self.resolved.pop_front();
        }
        self.resolved.push_back(unique_id);
    }
}

impl<U: UiAdapter> ChargePointCore<U> {
    /// Queues a Call. Its continuation runs exactly once: with the response,
    /// a timeout, or an offline/cancel error.
    pub(crate) fn enqueue_call<T: Serialize>(&mut self, context: CallContext, payload: T) {
        let allowed = match self.session_state {
            SessionState::Registered => true,
            SessionState::BootPending => context == CallContext::Boot,
            _ => false,
        };
        if !allowed {
            log::debug!("{} not sent while {:?}", context.action(), self.session_state);
            self.dispatch_response(context, Err(OcppError::Other(GenericError::Offline)));
            return;
        }
        let call = Call::new(self.get_uuid(), context.action().as_str(), payload);
        self.outbound_calls.push_back((call, context));
        self.process_calls();
    }

    pub(crate) fn process_calls(&mut self) {
        let limit = self.config.max_in_flight_calls.max(1);
        while self.pending_calls.len() < limit {
            let Some((call, context)) = self.outbound_calls.pop_front() else {
                break;
            };
            let now = self.now();
            let action = context.action();
            match self.pending_calls.register(
                call.unique_id.clone(),
                action,
                context,
                now,
                self.config.call_timeout,
            ) {
                Ok(()) => self.send_ws_msg(call.encode()),
                Err((e, context)) => {
                    log::error!("{}", e);
                    self.dispatch_response(context, Err(OcppError::Other(GenericError::Cancelled)));
                }
            }
        }
        self.arm_call_timer();
    }

    /// Keeps a single timer on the earliest outstanding deadline.
    pub(crate) fn arm_call_timer(&mut self) {
        match self.pending_calls.next_deadline() {
            Some(deadline) => {
                let remaining = deadline.duration_since(self.now());
                let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
                self.add_timeout(TimerId::CallTimeout, secs.max(1));
            }
            None => self.remove_timeout(TimerId::CallTimeout),
        }
    }

    pub(crate) fn handle_call_result(&mut self, result: CallResult) {
        let resolution = self.pending_calls.on_result(result);
        self.complete_call(resolution);
    }

    pub(crate) fn handle_call_error(&mut self, error: CallError<cpsim_core::v16::protocol_error::ProtocolError>) {
        log::error!(
            "call {} failed: {} {}",
            error.unique_id,
            error.error_code,
            error.error_description
        );
        let resolution = self.pending_calls.on_error(error);
        self.complete_call(resolution);
    }

    fn complete_call(
        &mut self,
        resolution: Result<Resolution<CallContext, cpsim_core::v16::protocol_error::ProtocolError>, CorrelationError>,
    ) {
        match resolution {
            Ok((request, res)) => {
                log::debug!(
                    "{} {} answered after {:?}",
                    request.action,
                    request.unique_id,
                    self.now().duration_since(request.sent_at)
                );
                self.dispatch_response(request.slot, res);
            }
            Err(e) => self.protocol_anomaly(e.to_string()),
        }
        self.process_calls();
    }

    pub(crate) fn sweep_call_timeouts(&mut self) {
        let expired = self.pending_calls.sweep_timeouts(self.now());
        for request in expired {
            log::warn!("{} {} timed out", request.action, request.unique_id);
            self.dispatch_response(request.slot, Err(OcppError::Other(GenericError::TimeOut)));
        }
        self.process_calls();
    }

    /// Fails every outstanding and queued Call with `err`.
    pub(crate) fn cancel_pending_calls(&mut self, err: GenericError) {
        let mut contexts: Vec<CallContext> = self
            .pending_calls
            .cancel_all()
            .into_iter()
            .map(|p| p.slot)
            .collect();
        contexts.extend(self.outbound_calls.drain(..).map(|(_, context)| context));
        self.remove_timeout(TimerId::CallTimeout);
        for context in contexts {
            self.dispatch_response(context, Err(OcppError::Other(err.clone())));
        }
    }

    fn parse_response<T: DeserializeOwned>(res: Result<Value, OcppError>) -> Result<T, OcppError> {
        res.and_then(|f| {
            serde_json::from_value::<T>(f).map_err(|_| OcppError::Other(GenericError::ParsingError))
        })
    }

    pub(crate) fn dispatch_response(&mut self, context: CallContext, res: Result<Value, OcppError>) {
        match context {
            CallContext::Boot => self.boot_notification_response(Self::parse_response(res)),
            CallContext::Heartbeat => self.heartbeat_response(Self::parse_response(res)),
            CallContext::Authorize { connector_id, id_tag } => {
                self.authorize_response(connector_id, id_tag, Self::parse_response(res))
            }
            CallContext::StatusNotification { connector_id } => {
                self.status_notification_response(connector_id, Self::parse_response(res))
            }
            CallContext::StartTransaction { local_id } => {
                self.start_transaction_response(local_id, Self::parse_response(res))
            }
            CallContext::StopTransaction { local_id } => {
                self.stop_transaction_response(local_id, Self::parse_response(res))
            }
            CallContext::MeterValues { connector_id } => {
                self.meter_values_response(connector_id, Self::parse_response(res))
            }
            CallContext::DataTransfer { message_id } => {
                self.data_transfer_response(message_id, Self::parse_response(res))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use cpsim_core::v16::protocol_error::ProtocolError;
    use serde_json::json;

    use super::*;

    fn table() -> CorrelationTable<&'static str> {
        let mut table = CorrelationTable::new();
        table.register("a".into(), Action::Heartbeat, "first", Instant(0), 10).unwrap();
        table.register("b".into(), Action::Authorize, "second", Instant(1_000_000), 10).unwrap();
        table
    }

    #[test]
    fn responses_match_by_id_in_any_order() {
        let mut table = table();
        let (request, res) = table
            .on_result::<ProtocolError>(CallResult { unique_id: "b".into(), payload: json!({"x": 1}) })
            .unwrap();
        assert_eq!(request.slot, "second");
        assert_eq!(res.unwrap(), json!({"x": 1}));

        let (request, res) = table
            .on_error(CallError::new("a".into(), ProtocolError::InternalError))
            .unwrap();
        assert_eq!(request.slot, "first");
        assert_eq!(res, Err(FrameError::Protocol(ProtocolError::InternalError)));
        assert!(table.is_empty());
    }

    #[test]
    fn unmatched_and_repeated_responses_are_reported() {
        let mut table = table();
        let unknown = table.on_result::<ProtocolError>(CallResult { unique_id: "zz".into(), payload: json!({}) });
        assert!(matches!(unknown, Err(CorrelationError::UnknownId(id)) if id == "zz"));

        table.on_result::<ProtocolError>(CallResult { unique_id: "a".into(), payload: json!({}) }).unwrap();
        let again = table.on_result::<ProtocolError>(CallResult { unique_id: "a".into(), payload: json!({}) });
        assert!(matches!(again, Err(CorrelationError::AlreadyResolved(_))));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn duplicate_id_hands_the_slot_back() {
        let mut table = table();
        let err = table
            .register("a".into(), Action::Heartbeat, "third", Instant(0), 10)
            .unwrap_err();
        assert_eq!(err, (CorrelationError::DuplicateId("a".into()), "third"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn timeout_resolves_exactly_once() {
        let mut table = table();
        assert_eq!(table.next_deadline(), Some(Instant(10_000_000)));
        assert!(table.sweep_timeouts(Instant(9_999_999)).is_empty());

        let expired = table.sweep_timeouts(Instant(10_000_000));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].slot, "first");
        assert!(table.sweep_timeouts(Instant(10_000_000)).is_empty());
        assert_eq!(table.next_deadline(), Some(Instant(11_000_000)));

        let late = table.on_result::<ProtocolError>(CallResult { unique_id: "a".into(), payload: json!({}) });
        assert!(matches!(late, Err(CorrelationError::AlreadyResolved(_))));
    }

    #[test]
    fn cancel_all_drains_oldest_first() {
        let mut table = table();
        let slots: Vec<_> = table.cancel_all().into_iter().map(|p| p.slot).collect();
        assert_eq!(slots, vec!["first", "second"]);
        assert!(table.is_empty());
        assert_eq!(table.next_deadline(), None);
    }
}
