use cpsim_core::v16::{
    messages::{RemoteStopTransactionRequest, RemoteStopTransactionResponse},
    protocol_error::ProtocolError,
    types::{Reason, RemoteStartStopStatus},
};

use crate::v16::{
    cp::core::ChargePointCore,
    drivers::ui::UiAdapter,
    events::websocket::CommandError,
    state_machine::connector::ConnectorState,
};

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn remote_stop_transaction_ocpp(
        &mut self,
        unique_id: String,
        req: RemoteStopTransactionRequest,
    ) {
        let Some(connector_id) = self.find_transaction(req.transaction_id) else {
            let err = CommandError::new(
                ProtocolError::GenericError,
                format!("no active transaction {}", req.transaction_id),
            );
            return self.reply::<RemoteStopTransactionResponse>(unique_id, Err(err));
        };
        self.reply(
            unique_id,
            Ok(RemoteStopTransactionResponse {
                status: RemoteStartStopStatus::Accepted,
            }),
        );
        self.stop_transaction(connector_id, Reason::Remote);
        self.change_connector_state(connector_id, ConnectorState::Finishing);
    }
}
