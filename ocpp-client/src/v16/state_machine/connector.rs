use cpsim_core::v16::{
    messages::StatusNotificationRequest,
    types::{ChargePointErrorCode, ChargePointStatus},
};

use crate::v16::{
    cp::core::ChargePointCore,
    drivers::ui::{StateEvent, UiAdapter},
};

use super::{call::CallContext, clock::Instant, session::SessionState, transaction::Transaction};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConnectorState {
    Available,
    /// Plugged in. `authorizing` is set while an Authorize for `id_tag` is outstanding.
    Preparing {
        id_tag: Option<String>,
        authorizing: bool,
    },
    Charging,
    /// Transaction stopped, StopTransaction not yet acknowledged.
    Finishing,
    Faulted(ChargePointErrorCode),
    Unavailable,
}

impl ConnectorState {
    pub fn status(&self) -> ChargePointStatus {
        match self {
            ConnectorState::Available => ChargePointStatus::Available,
            ConnectorState::Preparing { .. } => ChargePointStatus::Preparing,
            ConnectorState::Charging => ChargePointStatus::Charging,
            ConnectorState::Finishing => ChargePointStatus::Finishing,
            ConnectorState::Faulted(_) => ChargePointStatus::Faulted,
            ConnectorState::Unavailable => ChargePointStatus::Unavailable,
        }
    }

    pub fn error_code(&self) -> ChargePointErrorCode {
        match self {
            ConnectorState::Faulted(code) => *code,
            _ => ChargePointErrorCode::NoError,
        }
    }
}

pub(crate) struct Connector {
    pub state: ConnectorState,
    /// The running transaction. Stopped ones move to the core's stopping set.
    pub transaction: Option<Transaction>,
    /// Energy register in milli-watt-hours.
    pub meter_mwh: u64,
    pub last_sample: Instant,
    /// Inoperative was requested while busy; applied once the connector frees up.
    pub pending_inoperative: bool,
}

impl Connector {
    pub fn new(initial_wh: u64, now: Instant) -> Self {
        Self {
            state: ConnectorState::Available,
            transaction: None,
            meter_mwh: initial_wh.saturating_mul(1000),
            last_sample: now,
            pending_inoperative: false,
        }
    }

    pub fn meter_wh(&self) -> u64 {
        self.meter_mwh / 1000
    }

    /// Available, or Unavailable when an inoperative change was waiting.
    pub fn idle_state(&mut self) -> ConnectorState {
        if core::mem::take(&mut self.pending_inoperative) {
            ConnectorState::Unavailable
        } else {
            ConnectorState::Available
        }
    }
}

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn connector(&self, connector_id: usize) -> Option<&Connector> {
        connector_id
            .checked_sub(1)
            .and_then(|idx| self.connectors.get(idx))
    }

    pub(crate) fn connector_mut(&mut self, connector_id: usize) -> Option<&mut Connector> {
        connector_id
            .checked_sub(1)
            .and_then(|idx| self.connectors.get_mut(idx))
    }

    pub(crate) fn connector_ids(&self) -> core::ops::RangeInclusive<usize> {
        1..=self.connectors.len()
    }

    /// Connector holding the running transaction with server id `transaction_id`.
    pub(crate) fn find_transaction(&self, transaction_id: i32) -> Option<usize> {
        self.connector_ids().find(|id| {
            self.connector(*id)
                .and_then(|c| c.transaction.as_ref())
                .is_some_and(|t| !t.is_provisional() && t.transaction_id == transaction_id)
        })
    }

    /// Moves a connector to `state`. A status change is reported to the server.
    pub(crate) fn change_connector_state(&mut self, connector_id: usize, state: ConnectorState) {
        let Some(connector) = self.connector_mut(connector_id) else {
            return;
        };
        let before = (connector.state.status(), connector.state.error_code());
        connector.state = state;
        let after = (connector.state.status(), connector.state.error_code());
        if before != after {
            log::info!("connector {}: {:?} -> {:?}", connector_id, before.0, after.0);
            self.send_status_notification(connector_id);
        }
        self.publish_connector(connector_id);
    }

    pub(crate) fn publish_connector(&mut self, connector_id: usize) {
        let Some(connector) = self.connector(connector_id) else {
            return;
        };
        let event = StateEvent::Connector {
            connector_id,
            status: connector.state.status(),
            error_code: connector.state.error_code(),
            transaction_id: connector.transaction.as_ref().map(|t| t.transaction_id),
            meter_value: connector.transaction.as_ref().map(|t| t.meter_value),
        };
        self.publish(event);
    }

    pub(crate) fn send_status_notification(&mut self, connector_id: usize) {
        if self.session_state != SessionState::Registered {
            return;
        }
        let Some(connector) = self.connector(connector_id) else {
            return;
        };
        let req = StatusNotificationRequest {
            connector_id,
            status: connector.state.status(),
            error_code: connector.state.error_code(),
            info: None,
            timestamp: self.get_time(),
            vendor_id: None,
            vendor_error_code: None,
        };
        self.enqueue_call(CallContext::StatusNotification { connector_id }, req);
        self.send_vendor_status(connector_id);
    }

    pub(crate) fn on_status_notification_online(&mut self) {
        for connector_id in self.connector_ids() {
            self.send_status_notification(connector_id);
        }
    }
}
