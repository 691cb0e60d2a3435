use cpsim_core::v16::{
    messages::{UnlockConnectorRequest, UnlockConnectorResponse},
    types::{Reason, UnlockStatus},
};

use crate::v16::{
    cp::core::ChargePointCore, drivers::ui::UiAdapter, state_machine::connector::ConnectorState,
};

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn unlock_connector_ocpp(&mut self, unique_id: String, req: UnlockConnectorRequest) {
        let connector_id = req.connector_id;
        let Some(connector) = self.connector(connector_id) else {
            return self.reply(
                unique_id,
                Ok(UnlockConnectorResponse {
                    status: UnlockStatus::NotSupported,
                }),
            );
        };
        let running = connector.transaction.is_some();
        self.reply(
            unique_id,
            Ok(UnlockConnectorResponse {
                status: UnlockStatus::Unlocked,
            }),
        );
        if running {
            self.stop_transaction(connector_id, Reason::UnlockCommand);
            self.change_connector_state(connector_id, ConnectorState::Finishing);
        }
    }
}
