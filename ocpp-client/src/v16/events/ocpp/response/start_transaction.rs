use cpsim_core::v16::{messages::StartTransactionResponse, types::Reason};

use crate::v16::{
    cp::core::{ChargePointCore, OcppError},
    drivers::ui::UiAdapter,
    state_machine::{connector::ConnectorState, transaction::TransactionEventState},
};

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn start_transaction_response(
        &mut self,
        local_id: u32,
        res: Result<StartTransactionResponse, OcppError>,
    ) {
        if self.transaction_event_state != TransactionEventState::WaitingForResponse {
            return;
        }
        let resp = match res {
            Ok(resp) => resp,
            Err(e) => return self.transaction_failure(e),
        };
        self.pop_transaction_event();
        self.transaction_map.insert(local_id, resp.transaction_id);
        let accepted = resp.id_tag_info.is_valid(self.get_time());

        if let Some((_, transaction)) = self.stopping_transactions.get_mut(&local_id) {
            // stopped before the confirmation; its queued stop now has an id
            transaction.transaction_id = resp.transaction_id;
        } else if let Some(connector_id) = self.connector_ids().find(|id| {
            self.connector(*id)
                .and_then(|c| c.transaction.as_ref())
                .is_some_and(|t| t.local_id == local_id)
        }) {
            if let Some(transaction) = self
                .connector_mut(connector_id)
                .and_then(|c| c.transaction.as_mut())
            {
                transaction.transaction_id = resp.transaction_id;
            }
            if accepted {
                log::info!(
                    "connector {}: transaction {} started",
                    connector_id,
                    resp.transaction_id
                );
                self.start_meter(connector_id);
                self.change_connector_state(connector_id, ConnectorState::Charging);
            } else {
                log::warn!(
                    "connector {}: transaction {} not authorized ({:?})",
                    connector_id,
                    resp.transaction_id,
                    resp.id_tag_info.status
                );
                self.stop_transaction(connector_id, Reason::DeAuthorized);
                self.change_connector_state(connector_id, ConnectorState::Finishing);
            }
        }
        self.process_transaction();
    }
}
