use cpsim_core::v16::{
    messages::{ResetRequest, ResetResponse},
    types::{Reason, ResetStatus, ResetType},
};

use crate::v16::{
    cp::core::ChargePointCore, drivers::ui::UiAdapter, state_machine::connector::ConnectorState,
};

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn reset_ocpp(&mut self, unique_id: String, req: ResetRequest) {
        self.reply(
            unique_id,
            Ok(ResetResponse {
                status: ResetStatus::Accepted,
            }),
        );
        log::info!("{:?} reset requested", req.kind);
        self.pending_reset = Some(req.kind);
        let reason = match req.kind {
            ResetType::Soft => Reason::SoftReset,
            ResetType::Hard => Reason::HardReset,
        };
        let running: Vec<usize> = self
            .connector_ids()
            .filter(|id| self.connector(*id).is_some_and(|c| c.transaction.is_some()))
            .collect();
        for connector_id in running {
            self.stop_transaction(connector_id, reason);
            self.change_connector_state(connector_id, ConnectorState::Finishing);
        }
        self.check_pending_reset();
    }

    /// Performs a requested reset once every transaction message has been delivered.
    pub(crate) fn check_pending_reset(&mut self) {
        let Some(kind) = self.pending_reset else {
            return;
        };
        let running = self.connectors.iter().any(|c| c.transaction.is_some());
        if running || !self.stopping_transactions.is_empty() || !self.transaction_queue.is_empty()
        {
            return;
        }
        self.pending_reset = None;
        log::info!("performing {:?} reset", kind);
        self.go_offline(true);
        if kind == ResetType::Hard {
            for connector_id in self.connector_ids() {
                if let Some(connector) = self.connector_mut(connector_id) {
                    connector.pending_inoperative = false;
                    connector.state = ConnectorState::Available;
                }
                self.publish_connector(connector_id);
            }
        }
        self.reconnect_attempts = 0;
        self.open_connection();
    }
}
