use cpsim_core::v16::messages::HeartbeatRequest;

use crate::v16::{
    cp::core::ChargePointCore,
    drivers::{timers::TimerId, ui::UiAdapter},
};

use super::{call::CallContext, session::SessionState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum HeartbeatState {
    Idle,
    Sleeping,
    WaitingForResponse,
}

impl<U: UiAdapter> ChargePointCore<U> {
    /// An interval of 0 disables heartbeats.
    pub(crate) fn set_sleep_heartbeat(&mut self) {
        let interval = self.configs.heartbeat_interval.value;
        if interval == 0 {
            if self.heartbeat_state == HeartbeatState::Sleeping {
                self.remove_timeout(TimerId::Heartbeat);
            }
            self.heartbeat_state = HeartbeatState::Idle;
            return;
        }
        self.add_timeout(TimerId::Heartbeat, interval);
        self.heartbeat_state = HeartbeatState::Sleeping;
    }

    pub(crate) fn send_heartbeat(&mut self) {
        self.heartbeat_state = HeartbeatState::WaitingForResponse;
        self.enqueue_call(CallContext::Heartbeat, HeartbeatRequest {});
    }

    pub(crate) fn heartbeat_expired(&mut self) {
        if self.heartbeat_state == HeartbeatState::Sleeping
            && self.session_state == SessionState::Registered
        {
            self.send_heartbeat();
        }
    }

    pub(crate) fn on_heartbeat_online(&mut self) {
        self.missed_heartbeats = 0;
        self.set_sleep_heartbeat();
    }

    pub(crate) fn on_heartbeat_offline(&mut self) {
        if self.heartbeat_state == HeartbeatState::Sleeping {
            self.remove_timeout(TimerId::Heartbeat);
        }
        self.heartbeat_state = HeartbeatState::Idle;
    }

    /// Applies a changed HeartbeatInterval. An in-flight heartbeat picks it up
    /// when its response arrives.
    pub(crate) fn reschedule_heartbeat(&mut self) {
        if self.session_state == SessionState::Registered
            && self.heartbeat_state != HeartbeatState::WaitingForResponse
        {
            self.set_sleep_heartbeat();
        }
    }
}
