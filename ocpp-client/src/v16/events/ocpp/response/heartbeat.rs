use cpsim_core::{format::error::GenericError, v16::messages::HeartbeatResponse};

use crate::v16::{
    cp::core::{ChargePointCore, OcppError},
    drivers::ui::UiAdapter,
    state_machine::heartbeat::HeartbeatState,
};

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn heartbeat_response(&mut self, res: Result<HeartbeatResponse, OcppError>) {
        if self.heartbeat_state != HeartbeatState::WaitingForResponse {
            return;
        }
        self.heartbeat_state = HeartbeatState::Idle;
        match res {
            Ok(resp) => {
                self.set_time(resp.current_time);
                self.last_contact = Some(self.now());
                self.missed_heartbeats = 0;
                self.set_sleep_heartbeat();
            }
            Err(OcppError::Other(GenericError::Offline | GenericError::Cancelled)) => {}
            Err(OcppError::Protocol(code)) => {
                // the server answered, so the link is alive
                log::error!("Heartbeat rejected: {}", code);
                self.last_contact = Some(self.now());
                self.missed_heartbeats = 0;
                self.set_sleep_heartbeat();
            }
            Err(e) => {
                self.missed_heartbeats += 1;
                log::warn!(
                    "Heartbeat failed ({:?}), {} of {} missed",
                    e,
                    self.missed_heartbeats,
                    self.config.max_missed_heartbeats
                );
                if self.missed_heartbeats >= self.config.max_missed_heartbeats.max(1) {
                    self.go_offline(true);
                    self.schedule_reconnect(None);
                } else {
                    self.set_sleep_heartbeat();
                }
            }
        }
    }
}
