use chrono::SecondsFormat;
use cpsim_core::v16::{messages::DataTransferRequest, types::ChargePointStatus};

use crate::v16::{cp::core::ChargePointCore, drivers::ui::UiAdapter};

use super::{call::CallContext, session::SessionState};

pub(crate) const EVB_STATUS_NOTIFICATION: &str = "evbStatusNotification";

impl<U: UiAdapter> ChargePointCore<U> {
    /// Follows a StatusNotification with the vendor's own status record when
    /// `vendor_status_notification` is enabled.
    pub(crate) fn send_vendor_status(&mut self, connector_id: usize) {
        if !self.config.vendor_status_notification || self.session_state != SessionState::Registered {
            return;
        }
        let Some(data) = self.vendor_status_record(connector_id) else {
            return;
        };
        let req = DataTransferRequest {
            vendor_id: self.config.identity.vendor.clone(),
            message_id: Some(EVB_STATUS_NOTIFICATION.to_string()),
            data: Some(data),
        };
        self.enqueue_call(
            CallContext::DataTransfer {
                message_id: EVB_STATUS_NOTIFICATION.to_string(),
            },
            req,
        );
    }

    /// Compact comma separated record:
    /// `connectorId,status,errorCode,vehiclePresent,plugged,energyWh,timestamp,transactionId`.
    /// A provisional transaction reports 0.
    pub(crate) fn vendor_status_record(&self, connector_id: usize) -> Option<String> {
        let connector = self.connector(connector_id)?;
        let status = connector.state.status();
        let vehicle_present = status == ChargePointStatus::Charging;
        let plugged = matches!(
            status,
            ChargePointStatus::Preparing | ChargePointStatus::Charging | ChargePointStatus::Finishing
        );
        let transaction_id = connector
            .transaction
            .as_ref()
            .filter(|t| !t.is_provisional())
            .map_or(0, |t| t.transaction_id);
        Some(format!(
            "{},{:?},{:?},{},{},{},{},{}",
            connector_id,
            status,
            connector.state.error_code(),
            u8::from(vehicle_present),
            u8::from(plugged),
            connector.meter_wh(),
            self.timestamp().to_rfc3339_opts(SecondsFormat::Secs, true),
            transaction_id
        ))
    }
}
