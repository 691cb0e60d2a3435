use cpsim_core::v16::{
    messages::AuthorizeRequest,
    types::{ChargePointErrorCode, Reason},
};

use crate::v16::{
    cp::core::ChargePointCore,
    drivers::ui::{StateEvent, UiAdapter},
    state_machine::{call::CallContext, connector::ConnectorState},
};

impl<U: UiAdapter> ChargePointCore<U> {
    fn reject_intent(&mut self, connector_id: usize, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("connector {}: {}", connector_id, reason);
        self.publish(StateEvent::IntentRejected {
            connector_id,
            reason,
        });
    }

    pub(crate) fn plug_in_helper(&mut self, connector_id: usize, id_tag: String) {
        let Some(connector) = self.connector(connector_id) else {
            return self.reject_intent(connector_id, "no such connector");
        };
        if connector.state != ConnectorState::Available || self.connector_busy(connector_id) {
            let status = connector.state.status();
            return self.reject_intent(connector_id, format!("cannot plug in while {:?}", status));
        }
        self.change_connector_state(
            connector_id,
            ConnectorState::Preparing {
                id_tag: Some(id_tag.clone()),
                authorizing: false,
            },
        );
        let authorize = self.configs.authorize_required.value;
        self.begin_authorization(connector_id, id_tag, authorize);
    }

    /// Presents `id_tag` again on a connector left in Preparing after a denial.
    pub(crate) fn start_charge_helper(&mut self, connector_id: usize, id_tag: String) {
        let idle = self.connector(connector_id).is_some_and(|c| {
            c.transaction.is_none()
                && matches!(c.state, ConnectorState::Preparing { authorizing: false, .. })
        });
        if !idle {
            return self.reject_intent(connector_id, "connector is not waiting for a tag");
        }
        let authorize = self.configs.authorize_required.value;
        self.begin_authorization(connector_id, id_tag, authorize);
    }

    /// Authorizes `id_tag` first when `authorize` is set, otherwise starts right away.
    pub(crate) fn begin_authorization(&mut self, connector_id: usize, id_tag: String, authorize: bool) {
        if authorize {
            self.send_authorize(connector_id, id_tag);
        } else {
            self.start_transaction(connector_id, id_tag);
        }
    }

    fn send_authorize(&mut self, connector_id: usize, id_tag: String) {
        // status stays Preparing, nothing new to publish
        if let Some(connector) = self.connector_mut(connector_id) {
            connector.state = ConnectorState::Preparing {
                id_tag: Some(id_tag.clone()),
                authorizing: true,
            };
        }
        let req = AuthorizeRequest {
            id_tag: id_tag.clone(),
        };
        self.enqueue_call(
            CallContext::Authorize {
                connector_id,
                id_tag,
            },
            req,
        );
    }

    pub(crate) fn unplug_helper(&mut self, connector_id: usize) {
        let Some(connector) = self.connector(connector_id) else {
            return self.reject_intent(connector_id, "no such connector");
        };
        let running = connector.transaction.is_some();
        match (connector.state.clone(), running) {
            (ConnectorState::Preparing { .. } | ConnectorState::Charging, true) => {
                self.stop_transaction(connector_id, Reason::EVDisconnected);
                self.change_connector_state(connector_id, ConnectorState::Finishing);
            }
            (ConnectorState::Preparing { .. }, false) => {
                let idle = self.idle_state(connector_id);
                self.change_connector_state(connector_id, idle);
            }
            (state, _) => {
                let status = state.status();
                self.reject_intent(connector_id, format!("nothing to unplug while {:?}", status));
            }
        }
    }

    pub(crate) fn simulate_fault_helper(
        &mut self,
        connector_id: usize,
        error_code: Option<ChargePointErrorCode>,
    ) {
        let Some(connector) = self.connector(connector_id) else {
            return self.reject_intent(connector_id, "no such connector");
        };
        let running = connector.transaction.is_some();
        let error_code = error_code
            .filter(|code| *code != ChargePointErrorCode::NoError)
            .unwrap_or(ChargePointErrorCode::OtherError);
        if running {
            self.stop_transaction(connector_id, Reason::Other);
        }
        log::warn!("connector {}: fault {:?}", connector_id, error_code);
        self.change_connector_state(connector_id, ConnectorState::Faulted(error_code));
    }

    pub(crate) fn reset_fault_helper(&mut self, connector_id: usize) {
        let faulted = self
            .connector(connector_id)
            .is_some_and(|c| matches!(c.state, ConnectorState::Faulted(_)));
        if !faulted {
            return self.reject_intent(connector_id, "connector is not faulted");
        }
        let idle = self.idle_state(connector_id);
        self.change_connector_state(connector_id, idle);
    }
}
