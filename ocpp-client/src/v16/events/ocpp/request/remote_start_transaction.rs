use cpsim_core::v16::{
    messages::{RemoteStartTransactionRequest, RemoteStartTransactionResponse},
    protocol_error::ProtocolError,
    types::RemoteStartStopStatus,
};

use crate::v16::{
    cp::core::ChargePointCore,
    drivers::ui::UiAdapter,
    events::websocket::CommandError,
    state_machine::connector::ConnectorState,
};

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn remote_start_transaction_ocpp(
        &mut self,
        unique_id: String,
        req: RemoteStartTransactionRequest,
    ) {
        let connector_id = match self.remote_start_target(req.connector_id) {
            Ok(connector_id) => connector_id,
            Err(e) => return self.reply::<RemoteStartTransactionResponse>(unique_id, Err(e)),
        };
        self.reply(
            unique_id,
            Ok(RemoteStartTransactionResponse {
                status: RemoteStartStopStatus::Accepted,
            }),
        );
        log::info!("connector {}: remote start for {}", connector_id, req.id_tag);
        self.change_connector_state(
            connector_id,
            ConnectorState::Preparing {
                id_tag: Some(req.id_tag.clone()),
                authorizing: false,
            },
        );
        let authorize = self.configs.authorize_remote_transaction_requests.value;
        self.begin_authorization(connector_id, req.id_tag, authorize);
    }

    /// Without a connector id the first Available connector is used.
    fn remote_start_target(&self, connector_id: Option<usize>) -> Result<usize, CommandError> {
        let available = |id: usize| {
            self.connector(id)
                .is_some_and(|c| c.state == ConnectorState::Available && !self.connector_busy(id))
        };
        match connector_id {
            Some(id) if self.connector(id).is_none() => Err(CommandError::new(
                ProtocolError::PropertyConstraintViolation,
                format!("no connector {}", id),
            )),
            Some(id) if !available(id) => Err(CommandError::new(
                ProtocolError::NotSupported,
                format!("connector {} is not available", id),
            )),
            Some(id) => Ok(id),
            None => self.connector_ids().find(|id| available(*id)).ok_or_else(|| {
                CommandError::new(ProtocolError::NotSupported, "no connector is available")
            }),
        }
    }
}
