use cpsim_core::v16::{
    messages::{ChangeAvailabilityRequest, ChangeAvailabilityResponse},
    types::{AvailabilityStatus, AvailabilityType},
};

use crate::v16::{
    cp::core::ChargePointCore, drivers::ui::UiAdapter, state_machine::connector::ConnectorState,
};

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn change_availability_ocpp(
        &mut self,
        unique_id: String,
        req: ChangeAvailabilityRequest,
    ) {
        let targets: Vec<usize> = match req.connector_id {
            0 => self.connector_ids().collect(),
            id if self.connector(id).is_some() => vec![id],
            _ => {
                return self.reply(
                    unique_id,
                    Ok(ChangeAvailabilityResponse {
                        status: AvailabilityStatus::Rejected,
                    }),
                )
            }
        };
        let mut status = AvailabilityStatus::Accepted;
        let mut changes = Vec::new();
        for connector_id in targets {
            let (scheduled, change) = self.plan_availability(connector_id, req.kind);
            if scheduled {
                status = AvailabilityStatus::Scheduled;
            }
            if let Some(state) = change {
                changes.push((connector_id, state));
            }
        }
        self.reply(unique_id, Ok(ChangeAvailabilityResponse { status }));
        for (connector_id, state) in changes {
            self.change_connector_state(connector_id, state);
        }
    }

    /// Returns whether the change had to be deferred, and the state to move to now.
    fn plan_availability(
        &mut self,
        connector_id: usize,
        kind: AvailabilityType,
    ) -> (bool, Option<ConnectorState>) {
        let busy = self.connector_busy(connector_id);
        let Some(connector) = self.connector_mut(connector_id) else {
            return (false, None);
        };
        match kind {
            AvailabilityType::Inoperative => match connector.state {
                ConnectorState::Unavailable => (false, None),
                ConnectorState::Available if !busy => (false, Some(ConnectorState::Unavailable)),
                // applied by reset_fault
                ConnectorState::Faulted(_) => {
                    connector.pending_inoperative = true;
                    (false, None)
                }
                _ => {
                    connector.pending_inoperative = true;
                    (true, None)
                }
            },
            AvailabilityType::Operative => {
                connector.pending_inoperative = false;
                match connector.state {
                    ConnectorState::Unavailable => (false, Some(ConnectorState::Available)),
                    _ => (false, None),
                }
            }
        }
    }
}
