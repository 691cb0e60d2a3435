use cpsim_core::v16::{
    messages::{DataTransferRequest, DataTransferResponse},
    types::DataTransferStatus,
};

use crate::v16::{cp::core::ChargePointCore, drivers::ui::UiAdapter};

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn data_transfer_ocpp(&mut self, unique_id: String, req: DataTransferRequest) {
        let status = if req.vendor_id == self.config.identity.vendor {
            DataTransferStatus::Accepted
        } else {
            DataTransferStatus::UnknownVendorId
        };
        log::debug!(
            "DataTransfer from {} ({:?}): {:?}",
            req.vendor_id,
            req.message_id,
            status
        );
        self.reply(unique_id, Ok(DataTransferResponse { status, data: None }));
    }
}
