use crate::v16::{
    cp::core::ChargePointCore,
    drivers::{timers::TimerId, ui::UiAdapter},
};

use super::{call::CallContext, session::SessionState};

/// Retry delay used when a Pending response carries interval 0.
pub(crate) const DEFAULT_BOOT_RETRY: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BootState {
    Idle,
    Sleeping,
    WaitingForResponse,
}

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn send_boot_notification(&mut self) {
        self.boot_state = BootState::WaitingForResponse;
        let req = self.config.boot_request();
        self.enqueue_call(CallContext::Boot, req);
    }

    pub(crate) fn boot_expired(&mut self) {
        if self.boot_state == BootState::Sleeping
            && self.session_state == SessionState::BootPending
        {
            self.send_boot_notification();
        }
    }

    pub(crate) fn on_boot_offline(&mut self) {
        if self.boot_state == BootState::Sleeping {
            self.remove_timeout(TimerId::Boot);
        }
        self.boot_state = BootState::Idle;
    }

    pub(crate) fn notify_online(&mut self) {
        self.on_heartbeat_online();
        self.on_status_notification_online();
        self.process_transaction();
    }
}
