use cpsim_core::v16::messages::MeterValuesResponse;

use crate::v16::{
    cp::core::{ChargePointCore, OcppError},
    drivers::ui::UiAdapter,
};

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn meter_values_response(
        &mut self,
        connector_id: usize,
        res: Result<MeterValuesResponse, OcppError>,
    ) {
        if let Err(e) = res {
            log::debug!("MeterValues for connector {} failed: {:?}", connector_id, e);
        }
    }
}
