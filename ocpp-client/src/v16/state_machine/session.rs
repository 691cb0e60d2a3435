use cpsim_core::format::error::GenericError;

use crate::v16::{
    cp::core::ChargePointCore,
    drivers::{
        timers::TimerId,
        ui::{StateEvent, UiAdapter},
        websocket::TransportError,
    },
};

/// Connection and registration lifecycle of the single CSMS link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    /// Connected, waiting for BootNotification to be accepted.
    BootPending,
    Registered,
    Disconnecting,
}

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn set_session_state(&mut self, state: SessionState) {
        if self.session_state != state {
            log::info!("session {:?} -> {:?}", self.session_state, state);
            self.session_state = state;
            self.publish_registration();
        }
    }

    pub(crate) fn publish_registration(&mut self) {
        self.publish(StateEvent::Registration {
            registration_state: self.registration_status,
            session_state: self.session_state,
        });
    }

    pub(crate) fn start_session(&mut self) {
        self.stopped = false;
        match self.session_state {
            SessionState::Disconnected => {
                self.remove_timeout(TimerId::Reconnect);
                self.reschedule_meters();
                self.open_connection();
            }
            state => log::warn!("start ignored while {:?}", state),
        }
    }

    pub(crate) fn open_connection(&mut self) {
        self.set_session_state(SessionState::Connecting);
        self.connect();
    }

    pub(crate) fn on_ws_connected(&mut self) {
        match self.session_state {
            SessionState::Connecting => {
                self.set_session_state(SessionState::BootPending);
                self.send_boot_notification();
            }
            state => log::warn!("unexpected transport connect while {:?}", state),
        }
    }

    pub(crate) fn on_ws_connect_failed(&mut self, err: TransportError) {
        if self.session_state != SessionState::Connecting {
            return;
        }
        log::warn!("{}", err);
        self.set_session_state(SessionState::Disconnected);
        self.schedule_reconnect(None);
    }

    pub(crate) fn on_ws_disconnected(&mut self) {
        match self.session_state {
            SessionState::BootPending | SessionState::Registered => {
                log::warn!("transport closed");
                self.go_offline(false);
                self.schedule_reconnect(None);
            }
            SessionState::Connecting => self.on_ws_connect_failed(TransportError::NotConnected),
            _ => {}
        }
    }

    pub(crate) fn on_ws_send_failed(&mut self, err: TransportError) {
        match self.session_state {
            SessionState::BootPending | SessionState::Registered => {
                log::warn!("{}", err);
                self.go_offline(true);
                self.schedule_reconnect(None);
            }
            _ => {}
        }
    }

    /// Leaves the connected states. Transactions survive; their queued
    /// messages are resent after the next registration.
    pub(crate) fn go_offline(&mut self, close: bool) {
        self.set_session_state(SessionState::Disconnected);
        self.on_boot_offline();
        self.on_heartbeat_offline();
        self.on_transaction_offline();
        self.cancel_pending_calls(GenericError::Cancelled);
        if close {
            self.close_connection();
        }
    }

    /// `delay` overrides the exponential backoff.
    pub(crate) fn schedule_reconnect(&mut self, delay: Option<u64>) {
        if self.stopped {
            return;
        }
        let delay = delay.unwrap_or_else(|| self.backoff_delay());
        self.reconnect_attempts = self.reconnect_attempts.saturating_add(1);
        log::info!("reconnecting in {}s (attempt {})", delay, self.reconnect_attempts);
        self.add_timeout(TimerId::Reconnect, delay);
    }

    fn backoff_delay(&self) -> u64 {
        let factor = 2u64.saturating_pow(self.reconnect_attempts);
        self.config
            .reconnect_backoff_base
            .saturating_mul(factor)
            .min(self.config.reconnect_backoff_max)
    }

    pub(crate) fn reconnect_expired(&mut self) {
        if self.session_state == SessionState::Disconnected && !self.stopped {
            self.open_connection();
        }
    }

    pub(crate) fn stop_session(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        let was_connected = self.session_state != SessionState::Disconnected;
        self.set_session_state(SessionState::Disconnecting);
        self.on_boot_offline();
        self.on_heartbeat_offline();
        self.on_transaction_offline();
        self.cancel_pending_calls(GenericError::Cancelled);
        self.remove_all_timeouts();
        if was_connected {
            self.close_connection();
        }
        self.set_session_state(SessionState::Disconnected);
    }
}
