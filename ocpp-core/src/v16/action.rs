/// OCPP 1.6 action names known to the simulator.
///
/// Anything else on the wire is kept verbatim in [`Action::Unknown`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    BootNotification,
    Heartbeat,
    Authorize,
    StartTransaction,
    StopTransaction,
    MeterValues,
    StatusNotification,
    RemoteStartTransaction,
    RemoteStopTransaction,
    UnlockConnector,
    Reset,
    ChangeAvailability,
    GetConfiguration,
    ChangeConfiguration,
    DataTransfer,
    Unknown(String),
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::BootNotification => "BootNotification",
            Action::Heartbeat => "Heartbeat",
            Action::Authorize => "Authorize",
            Action::StartTransaction => "StartTransaction",
            Action::StopTransaction => "StopTransaction",
            Action::MeterValues => "MeterValues",
            Action::StatusNotification => "StatusNotification",
            Action::RemoteStartTransaction => "RemoteStartTransaction",
            Action::RemoteStopTransaction => "RemoteStopTransaction",
            Action::UnlockConnector => "UnlockConnector",
            Action::Reset => "Reset",
            Action::ChangeAvailability => "ChangeAvailability",
            Action::GetConfiguration => "GetConfiguration",
            Action::ChangeConfiguration => "ChangeConfiguration",
            Action::DataTransfer => "DataTransfer",
            Action::Unknown(name) => name.as_str(),
        }
    }

    /// Actions a charge point sends and a central system answers.
    pub fn is_charge_point_initiated(&self) -> bool {
        matches!(
            self,
            Action::BootNotification
                | Action::Heartbeat
                | Action::Authorize
                | Action::StartTransaction
                | Action::StopTransaction
                | Action::MeterValues
                | Action::StatusNotification
        )
    }
}

impl From<&str> for Action {
    fn from(value: &str) -> Self {
        match value {
            "BootNotification" => Action::BootNotification,
            "Heartbeat" => Action::Heartbeat,
            "Authorize" => Action::Authorize,
            "StartTransaction" => Action::StartTransaction,
            "StopTransaction" => Action::StopTransaction,
            "MeterValues" => Action::MeterValues,
            "StatusNotification" => Action::StatusNotification,
            "RemoteStartTransaction" => Action::RemoteStartTransaction,
            "RemoteStopTransaction" => Action::RemoteStopTransaction,
            "UnlockConnector" => Action::UnlockConnector,
            "Reset" => Action::Reset,
            "ChangeAvailability" => Action::ChangeAvailability,
            "GetConfiguration" => Action::GetConfiguration,
            "ChangeConfiguration" => Action::ChangeConfiguration,
            "DataTransfer" => Action::DataTransfer,
            other => Action::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
