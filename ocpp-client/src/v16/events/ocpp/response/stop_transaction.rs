use cpsim_core::v16::messages::StopTransactionResponse;

use crate::v16::{
    cp::core::{ChargePointCore, OcppError},
    drivers::ui::UiAdapter,
    state_machine::transaction::TransactionEventState,
};

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn stop_transaction_response(
        &mut self,
        local_id: u32,
        res: Result<StopTransactionResponse, OcppError>,
    ) {
        if self.transaction_event_state != TransactionEventState::WaitingForResponse {
            return;
        }
        if let Err(e) = res {
            return self.transaction_failure(e);
        }
        self.pop_transaction_event();
        self.archive_transaction(local_id);
        self.process_transaction();
    }
}
