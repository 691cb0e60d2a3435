use cpsim_core::v16::messages::StatusNotificationResponse;

use crate::v16::{
    cp::core::{ChargePointCore, OcppError},
    drivers::ui::UiAdapter,
};

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn status_notification_response(
        &mut self,
        connector_id: usize,
        res: Result<StatusNotificationResponse, OcppError>,
    ) {
        if let Err(e) = res {
            log::debug!("StatusNotification for connector {} failed: {:?}", connector_id, e);
        }
    }
}
