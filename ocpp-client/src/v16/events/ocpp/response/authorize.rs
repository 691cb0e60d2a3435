use cpsim_core::v16::messages::AuthorizeResponse;

use crate::v16::{
    cp::core::{ChargePointCore, OcppError},
    drivers::ui::{StateEvent, UiAdapter},
    state_machine::connector::ConnectorState,
};

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn authorize_response(
        &mut self,
        connector_id: usize,
        id_tag: String,
        res: Result<AuthorizeResponse, OcppError>,
    ) {
        // the driver may have unplugged meanwhile
        let waiting = self.connector(connector_id).is_some_and(|c| {
            matches!(
                &c.state,
                ConnectorState::Preparing { id_tag: Some(tag), authorizing: true } if *tag == id_tag
            )
        });
        if !waiting {
            log::debug!("stale Authorize for {} on connector {}", id_tag, connector_id);
            return;
        }
        let status = match res {
            Ok(resp) if resp.id_tag_info.is_valid(self.get_time()) => {
                log::info!("connector {}: {} authorized", connector_id, id_tag);
                return self.start_transaction(connector_id, id_tag);
            }
            Ok(resp) => Some(resp.id_tag_info.status),
            Err(e) => {
                log::error!("Authorize for {} failed: {:?}", id_tag, e);
                None
            }
        };
        log::warn!("connector {}: {} not authorized ({:?})", connector_id, id_tag, status);
        if let Some(connector) = self.connector_mut(connector_id) {
            connector.state = ConnectorState::Preparing {
                id_tag: Some(id_tag.clone()),
                authorizing: false,
            };
        }
        self.publish_connector(connector_id);
        self.publish(StateEvent::AuthorizationDenied {
            connector_id,
            id_tag,
            status,
        });
    }
}
