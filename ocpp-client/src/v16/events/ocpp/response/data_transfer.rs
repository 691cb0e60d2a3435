use cpsim_core::v16::{messages::DataTransferResponse, types::DataTransferStatus};

use crate::v16::{
    cp::core::{ChargePointCore, OcppError},
    drivers::ui::UiAdapter,
};

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn data_transfer_response(
        &mut self,
        message_id: String,
        res: Result<DataTransferResponse, OcppError>,
    ) {
        match res {
            Ok(resp) if resp.status == DataTransferStatus::Accepted => {
                log::debug!("DataTransfer {} accepted", message_id);
            }
            Ok(resp) => log::warn!("DataTransfer {} answered {:?}", message_id, resp.status),
            Err(e) => log::debug!("DataTransfer {} failed: {:?}", message_id, e),
        }
    }
}
