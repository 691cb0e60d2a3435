use cpsim_core::{
    format::{
        frame::{Call, CallError, CallResult, Frame},
        message::EncodeDecode,
    },
    v16::{action::Action, protocol_error::ProtocolError, types::RegistrationStatus},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::v16::{cp::core::ChargePointCore, drivers::ui::UiAdapter, state_machine::session::SessionState};

/// A Call the charge point refuses, answered with a CallError.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CommandError {
    pub code: ProtocolError,
    pub description: String,
}

impl CommandError {
    pub fn new(code: ProtocolError, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }
}

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn send_error(&mut self, unique_id: String, code: ProtocolError, description: impl Into<String>) {
        let err = CallError::new(unique_id, code).with_description(description);
        self.send_ws_msg(err.encode());
    }

    /// Answers a Call. Handlers reply before applying side effects so the
    /// response precedes any Call they trigger.
    pub(crate) fn reply<T: Serialize>(&mut self, unique_id: String, res: Result<T, CommandError>) {
        match res {
            Ok(payload) => {
                let res = CallResult::new(unique_id, payload);
                self.send_ws_msg(res.encode());
            }
            Err(e) => {
                log::warn!("refusing call {}: {} {}", unique_id, e.code, e.description);
                self.send_error(unique_id, e.code, e.description);
            }
        }
    }

    pub(crate) fn got_ws_msg_helper(&mut self, msg: String) {
        match Frame::<ProtocolError>::decode(&msg) {
            Ok(Frame::Call(call)) => self.handle_incoming_call(call),
            Ok(Frame::CallResult(res)) => self.handle_call_result(res),
            Ok(Frame::CallError(err)) => self.handle_call_error(err),
            Err(e) => {
                self.protocol_anomaly(format!("malformed frame: {}", e));
                if let (true, Some(unique_id)) = (e.is_call(), e.unique_id.clone()) {
                    self.send_error(unique_id, ProtocolError::FormationViolation, e.kind.to_string());
                }
            }
        }
    }

    fn handle_incoming_call(&mut self, call: Call) {
        let action = Action::from(call.action.as_str());
        match action {
            Action::RemoteStartTransaction => {
                self.handle_call(call, Self::remote_start_transaction_ocpp)
            }
            Action::RemoteStopTransaction => {
                self.handle_call(call, Self::remote_stop_transaction_ocpp)
            }
            Action::UnlockConnector => self.handle_call(call, Self::unlock_connector_ocpp),
            Action::Reset => self.handle_call(call, Self::reset_ocpp),
            Action::ChangeAvailability => self.handle_call(call, Self::change_availability_ocpp),
            Action::GetConfiguration => self.handle_call(call, Self::get_configuration_ocpp),
            Action::ChangeConfiguration => {
                self.handle_call(call, Self::change_configuration_ocpp)
            }
            Action::DataTransfer => self.handle_call(call, Self::data_transfer_ocpp),
            Action::BootNotification
            | Action::Heartbeat
            | Action::Authorize
            | Action::StartTransaction
            | Action::StopTransaction
            | Action::MeterValues
            | Action::StatusNotification => {
                self.send_error(
                    call.unique_id,
                    ProtocolError::NotSupported,
                    format!("{} is sent by the charge point", action),
                );
            }
            Action::Unknown(name) => {
                self.send_error(
                    call.unique_id,
                    ProtocolError::NotImplemented,
                    format!("unknown action {}", name),
                );
            }
        }
    }

    /// Pending registrations may not start or stop transactions remotely;
    /// rejected ones may do nothing. A remote start or stop also needs the
    /// current connection to be registered, since its Calls go out right away.
    fn is_registered(&self, action: &Action) -> bool {
        let remote_tx = matches!(
            action,
            Action::RemoteStartTransaction | Action::RemoteStopTransaction
        );
        if remote_tx && self.session_state != SessionState::Registered {
            return false;
        }
        match self.registration_status {
            RegistrationStatus::Accepted => true,
            RegistrationStatus::Pending => !remote_tx,
            RegistrationStatus::Rejected => false,
        }
    }

    fn handle_call<T: DeserializeOwned>(&mut self, call: Call, handler: fn(&mut Self, String, T)) {
        let Call {
            unique_id,
            action,
            payload,
        } = call;
        match serde_json::from_value::<T>(payload) {
            Ok(req) => {
                if self.is_registered(&Action::from(action.as_str())) {
                    handler(self, unique_id, req);
                } else {
                    self.send_error(
                        unique_id,
                        ProtocolError::SecurityError,
                        format!(
                            "{} not allowed while {:?}/{:?}",
                            action, self.registration_status, self.session_state
                        ),
                    );
                }
            }
            Err(e) => {
                self.send_error(unique_id, ProtocolError::FormationViolation, e.to_string());
            }
        }
    }
}
