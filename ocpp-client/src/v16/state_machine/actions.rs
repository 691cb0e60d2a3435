use crate::v16::{
    cp::core::ChargePointCore,
    drivers::{
        timers::TimerId,
        ui::{StateEvent, UiAdapter},
    },
};

use super::session::SessionState;

/// Side effects the core asks its driver to perform, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreActions {
    Connect(String),
    SendWsMsg(String),
    CloseConnection,
    /// Arm or re-arm a one-shot timer, in seconds from now.
    AddTimeout(TimerId, u64),
    RemoveTimeout(TimerId),
    RemoveAllTimeouts,
}

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn connect(&mut self) {
        self.queued_actions
            .push_back(CoreActions::Connect(self.config.connect_url()));
    }

    pub(crate) fn send_ws_msg(&mut self, msg: String) {
        match self.session_state {
            SessionState::BootPending | SessionState::Registered => {
                self.queued_actions.push_back(CoreActions::SendWsMsg(msg));
            }
            _ => {
                log::debug!("dropping outbound frame while {:?}: {}", self.session_state, msg);
            }
        }
    }

    pub(crate) fn close_connection(&mut self) {
        self.queued_actions.push_back(CoreActions::CloseConnection);
    }

    pub(crate) fn add_timeout(&mut self, timer_id: TimerId, timeout_secs: u64) {
        self.queued_actions
            .push_back(CoreActions::AddTimeout(timer_id, timeout_secs));
    }

    pub(crate) fn remove_timeout(&mut self, timer_id: TimerId) {
        self.queued_actions
            .push_back(CoreActions::RemoveTimeout(timer_id));
    }

    pub(crate) fn remove_all_timeouts(&mut self) {
        self.queued_actions.push_back(CoreActions::RemoveAllTimeouts);
    }

    pub(crate) fn publish(&mut self, event: StateEvent) {
        self.ui.publish(event);
    }

    pub(crate) fn protocol_anomaly(&mut self, description: String) {
        log::warn!("protocol anomaly: {}", description);
        self.publish(StateEvent::ProtocolAnomaly { description });
    }
}
