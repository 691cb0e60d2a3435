use cpsim_core::v16::{messages::BootNotificationResponse, types::RegistrationStatus};

use crate::v16::{
    cp::core::{ChargePointCore, OcppError},
    drivers::{timers::TimerId, ui::UiAdapter},
    state_machine::{
        boot::{BootState, DEFAULT_BOOT_RETRY},
        session::SessionState,
    },
};

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn boot_notification_response(
        &mut self,
        res: Result<BootNotificationResponse, OcppError>,
    ) {
        if self.session_state != SessionState::BootPending
            || self.boot_state != BootState::WaitingForResponse
        {
            return;
        }
        self.boot_state = BootState::Idle;
        let resp = match res {
            Ok(resp) => resp,
            Err(e) => {
                log::error!("BootNotification failed: {:?}", e);
                self.go_offline(true);
                self.schedule_reconnect(None);
                return;
            }
        };
        self.set_time(resp.current_time);
        self.registration_status = resp.status;
        match resp.status {
            RegistrationStatus::Accepted => {
                if resp.interval > 0 {
                    self.configs.heartbeat_interval.update(resp.interval);
                }
                self.reconnect_attempts = 0;
                self.last_contact = Some(self.now());
                self.set_session_state(SessionState::Registered);
                self.notify_online();
            }
            RegistrationStatus::Pending => {
                let delay = if resp.interval > 0 {
                    resp.interval
                } else {
                    DEFAULT_BOOT_RETRY
                };
                self.publish_registration();
                self.add_timeout(TimerId::Boot, delay);
                self.boot_state = BootState::Sleeping;
            }
            RegistrationStatus::Rejected => {
                log::warn!("registration rejected, retry in {}s", resp.interval);
                self.publish_registration();
                self.go_offline(true);
                self.schedule_reconnect((resp.interval > 0).then_some(resp.interval));
            }
        }
    }
}
