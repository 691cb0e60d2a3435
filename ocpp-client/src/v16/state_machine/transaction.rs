use chrono::{DateTime, Utc};
use cpsim_core::{
    format::error::GenericError,
    v16::{
        messages::{StartTransactionRequest, StopTransactionRequest},
        types::{MeterValue, Reason},
    },
};

use crate::v16::{
    cp::core::{ChargePointCore, OcppError},
    drivers::{
        timers::TimerId,
        ui::{StateEvent, UiAdapter},
    },
};

use super::{call::CallContext, connector::ConnectorState, session::SessionState};

/// One charging session on a connector.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub local_id: u32,
    /// Server assigned id, or `-local_id` until StartTransaction is confirmed.
    pub transaction_id: i32,
    pub id_tag: String,
    pub meter_start: u64,
    pub meter_value: u64,
    pub start_timestamp: DateTime<Utc>,
    pub stop_timestamp: Option<DateTime<Utc>>,
    pub stop_reason: Option<Reason>,
}

impl Transaction {
    pub fn is_provisional(&self) -> bool {
        self.transaction_id == provisional_id(self.local_id)
    }
}

fn provisional_id(local_id: u32) -> i32 {
    -(i32::try_from(local_id).unwrap_or(i32::MAX))
}

#[derive(Debug, Clone)]
pub(crate) enum TransactionEvent {
    Start {
        local_id: u32,
        connector_id: usize,
        id_tag: String,
        meter_start: u64,
        timestamp: DateTime<Utc>,
    },
    Stop {
        local_id: u32,
        id_tag: Option<String>,
        meter_stop: u64,
        timestamp: DateTime<Utc>,
        reason: Reason,
        transaction_data: Vec<MeterValue>,
    },
}

impl TransactionEvent {
    fn local_id(&self) -> u32 {
        match self {
            TransactionEvent::Start { local_id, .. } | TransactionEvent::Stop { local_id, .. } => {
                *local_id
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TransactionEventState {
    Idle,
    /// Waiting out the retry delay.
    Sleeping,
    WaitingForResponse,
}

impl<U: UiAdapter> ChargePointCore<U> {
    /// Creates the transaction with a provisional id and queues StartTransaction.
    pub(crate) fn start_transaction(&mut self, connector_id: usize, id_tag: String) {
        let local_id = self.next_local_id;
        self.next_local_id = self.next_local_id.wrapping_add(1).max(1);
        let timestamp = self.timestamp();
        let Some(connector) = self.connector_mut(connector_id) else {
            return;
        };
        let meter_start = connector.meter_wh();
        connector.transaction = Some(Transaction {
            local_id,
            transaction_id: provisional_id(local_id),
            id_tag: id_tag.clone(),
            meter_start,
            meter_value: meter_start,
            start_timestamp: timestamp,
            stop_timestamp: None,
            stop_reason: None,
        });
        connector.state = ConnectorState::Preparing {
            id_tag: Some(id_tag.clone()),
            authorizing: false,
        };
        log::info!("connector {}: starting transaction {} for {}", connector_id, local_id, id_tag);
        self.publish_connector(connector_id);
        self.push_transaction_event(TransactionEvent::Start {
            local_id,
            connector_id,
            id_tag,
            meter_start,
            timestamp,
        });
    }

    /// Ends the running transaction and queues StopTransaction. The caller
    /// decides the connector's next state.
    pub(crate) fn stop_transaction(&mut self, connector_id: usize, reason: Reason) {
        let meter_stop = self.advance_meter(connector_id, false);
        let timestamp = self.timestamp();
        self.stop_meter(connector_id);
        let Some(mut transaction) = self
            .connector_mut(connector_id)
            .and_then(|c| c.transaction.take())
        else {
            return;
        };
        transaction.meter_value = transaction.meter_value.max(meter_stop);
        transaction.stop_timestamp = Some(timestamp);
        transaction.stop_reason = Some(reason);
        log::info!(
            "connector {}: stopping transaction {} ({:?}), meter {} Wh",
            connector_id,
            transaction.transaction_id,
            reason,
            transaction.meter_value
        );
        let event = TransactionEvent::Stop {
            local_id: transaction.local_id,
            id_tag: Some(transaction.id_tag.clone()),
            meter_stop: transaction.meter_value,
            timestamp,
            reason,
            transaction_data: self.transaction_end_data(transaction.meter_value, timestamp),
        };
        self.stopping_transactions
            .insert(transaction.local_id, (connector_id, transaction));
        self.push_transaction_event(event);
    }

    /// Connector has a transaction that is running or still being stopped.
    pub(crate) fn connector_busy(&self, connector_id: usize) -> bool {
        let running = self
            .connector(connector_id)
            .is_some_and(|c| c.transaction.is_some());
        running
            || self
                .stopping_transactions
                .values()
                .any(|(id, _)| *id == connector_id)
    }

    fn push_transaction_event(&mut self, event: TransactionEvent) {
        self.transaction_queue.push_back(event);
        self.process_transaction();
    }

    fn server_transaction_id(&self, local_id: u32) -> Option<i32> {
        self.transaction_map.get(&local_id).copied()
    }

    /// Sends the head of the transaction queue, one message at a time, while registered.
    pub(crate) fn process_transaction(&mut self) {
        loop {
            if self.session_state != SessionState::Registered
                || self.transaction_event_state != TransactionEventState::Idle
            {
                return;
            }
            let Some(event) = self.transaction_queue.front().cloned() else {
                return;
            };
            match event {
                TransactionEvent::Start {
                    local_id,
                    connector_id,
                    id_tag,
                    meter_start,
                    timestamp,
                } => {
                    self.transaction_event_state = TransactionEventState::WaitingForResponse;
                    self.transaction_event_retries += 1;
                    let req = StartTransactionRequest {
                        connector_id,
                        id_tag,
                        meter_start,
                        reservation_id: None,
                        timestamp,
                    };
                    self.enqueue_call(CallContext::StartTransaction { local_id }, req);
                    return;
                }
                TransactionEvent::Stop {
                    local_id,
                    id_tag,
                    meter_stop,
                    timestamp,
                    reason,
                    transaction_data,
                } => match self.server_transaction_id(local_id) {
                    Some(transaction_id) => {
                        self.transaction_event_state = TransactionEventState::WaitingForResponse;
                        self.transaction_event_retries += 1;
                        let req = StopTransactionRequest {
                            transaction_id,
                            id_tag,
                            meter_stop,
                            timestamp,
                            reason: Some(reason),
                            transaction_data: Some(transaction_data),
                        };
                        self.enqueue_call(CallContext::StopTransaction { local_id }, req);
                        return;
                    }
                    None => {
                        log::warn!("transaction {} never got an id, dropping its stop", local_id);
                        self.transaction_queue.pop_front();
                        self.archive_transaction(local_id);
                    }
                },
            }
        }
    }

    pub(crate) fn transaction_retry_expired(&mut self) {
        if self.transaction_event_state == TransactionEventState::Sleeping {
            self.transaction_event_state = TransactionEventState::Idle;
            self.process_transaction();
        }
    }

    pub(crate) fn on_transaction_offline(&mut self) {
        if self.transaction_event_state == TransactionEventState::Sleeping {
            self.remove_timeout(TimerId::TransactionRetry);
            self.transaction_event_state = TransactionEventState::Idle;
        }
    }

    pub(crate) fn pop_transaction_event(&mut self) {
        self.transaction_queue.pop_front();
        self.transaction_event_state = TransactionEventState::Idle;
        self.transaction_event_retries = 0;
    }

    /// The head stays queued on offline/cancel; other failures count as an attempt.
    pub(crate) fn transaction_failure(&mut self, err: OcppError) {
        self.transaction_event_state = TransactionEventState::Idle;
        match err {
            OcppError::Other(GenericError::Offline | GenericError::Cancelled) => {
                self.transaction_event_retries = self.transaction_event_retries.saturating_sub(1);
            }
            err => {
                let attempts = self.configs.transaction_message_attempts.value;
                log::error!(
                    "transaction message failed ({:?}), attempt {} of {}",
                    err,
                    self.transaction_event_retries,
                    attempts
                );
                if self.transaction_event_retries >= attempts {
                    if let Some(event) = self.transaction_queue.pop_front() {
                        self.transaction_event_retries = 0;
                        self.drop_transaction_event(event);
                    }
                    self.process_transaction();
                } else {
                    let delay = self
                        .configs
                        .transaction_message_retry_interval
                        .value
                        .saturating_mul(self.transaction_event_retries);
                    self.transaction_event_state = TransactionEventState::Sleeping;
                    self.add_timeout(TimerId::TransactionRetry, delay);
                }
            }
        }
    }

    fn drop_transaction_event(&mut self, event: TransactionEvent) {
        let local_id = event.local_id();
        match event {
            TransactionEvent::Start { connector_id, .. } => {
                log::warn!("giving up on StartTransaction for transaction {}", local_id);
                let running = self
                    .connector(connector_id)
                    .and_then(|c| c.transaction.as_ref())
                    .is_some_and(|t| t.local_id == local_id);
                if running {
                    self.stop_meter(connector_id);
                    let mut in_use = false;
                    if let Some(connector) = self.connector_mut(connector_id) {
                        connector.transaction = None;
                        in_use = matches!(
                            connector.state,
                            ConnectorState::Preparing { .. } | ConnectorState::Charging
                        );
                    }
                    if in_use {
                        let idle = self.idle_state(connector_id);
                        self.change_connector_state(connector_id, idle);
                    } else {
                        self.publish_connector(connector_id);
                    }
                    self.publish(StateEvent::IntentRejected {
                        connector_id,
                        reason: "StartTransaction was not accepted by the central system".into(),
                    });
                }
            }
            TransactionEvent::Stop { .. } => {
                log::warn!("giving up on StopTransaction for transaction {}", local_id);
                self.archive_transaction(local_id);
            }
        }
    }

    pub(crate) fn idle_state(&mut self, connector_id: usize) -> ConnectorState {
        self.connector_mut(connector_id)
            .map(|c| c.idle_state())
            .unwrap_or(ConnectorState::Available)
    }

    /// Publishes the finished transaction and frees its connector.
    pub(crate) fn archive_transaction(&mut self, local_id: u32) {
        self.transaction_map.remove(&local_id);
        if let Some((connector_id, transaction)) = self.stopping_transactions.remove(&local_id) {
            self.publish(StateEvent::TransactionEnded {
                connector_id,
                transaction,
            });
            let finishing = self
                .connector(connector_id)
                .is_some_and(|c| c.state == ConnectorState::Finishing);
            if finishing && !self.connector_busy(connector_id) {
                let idle = self.idle_state(connector_id);
                self.change_connector_state(connector_id, idle);
            }
        }
        self.check_pending_reset();
    }
}
