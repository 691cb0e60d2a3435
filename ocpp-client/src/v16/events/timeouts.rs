use crate::v16::{
    cp::core::ChargePointCore,
    drivers::{timers::TimerId, ui::UiAdapter},
};

impl<U: UiAdapter> ChargePointCore<U> {
    /// Timers are one-shot; the driver forgets a timer once it fires.
    pub(crate) fn handle_timeout_helper(&mut self, id: TimerId) {
        log::trace!("timer fired: {:?}", id);
        match id {
            TimerId::Boot => self.boot_expired(),
            TimerId::Heartbeat => self.heartbeat_expired(),
            TimerId::CallTimeout => self.sweep_call_timeouts(),
            TimerId::Reconnect => self.reconnect_expired(),
            TimerId::TransactionRetry => self.transaction_retry_expired(),
            TimerId::MeterSample(connector_id) => self.meter_sample_expired(connector_id),
        }
    }
}
