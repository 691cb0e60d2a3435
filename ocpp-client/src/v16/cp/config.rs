use cpsim_core::v16::messages::BootNotificationRequest;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing required identity field `{0}`")]
    MissingIdentity(&'static str),
    #[error("central system url must start with ws:// or wss://, got `{0}`")]
    InvalidUrl(String),
    #[error("unknown configuration key `{0}`")]
    UnknownKey(String),
    #[error("invalid value `{value}` for configuration key `{key}`")]
    InvalidValue { key: String, value: String },
}

/// Who the simulated charge point claims to be. Fixed for the lifetime of the core.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct ChargePointIdentity {
    pub charge_point_id: String,
    pub vendor: String,
    pub model: String,
    pub serial_number: String,
    #[serde(default)]
    pub firmware_version: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
pub struct ChargePointConfig {
    pub cms_url: String,
    pub identity: ChargePointIdentity,
    /// Seconds before an unanswered Call fails with a timeout.
    #[serde(default = "default_call_timeout")]
    pub call_timeout: u64,
    #[serde(default = "default_max_in_flight_calls")]
    pub max_in_flight_calls: usize,
    #[serde(default = "default_backoff_base")]
    pub reconnect_backoff_base: u64,
    #[serde(default = "default_backoff_max")]
    pub reconnect_backoff_max: u64,
    /// Consecutive failed heartbeats tolerated before the link is considered dead.
    #[serde(default = "default_max_missed_heartbeats")]
    pub max_missed_heartbeats: u32,
    #[serde(default = "default_power")]
    pub simulated_power_w: u64,
    #[serde(default)]
    pub initial_meter_wh: u64,
    /// Overrides for the OCPP configuration keys, applied on top of the defaults.
    #[serde(default)]
    pub default_ocpp_configs: Vec<(String, String)>,
    #[serde(default)]
    pub seed: u64,
    /// Mirror every StatusNotification with a vendor `evbStatusNotification` DataTransfer.
    #[serde(default)]
    pub vendor_status_notification: bool,
}

fn default_call_timeout() -> u64 {
    30
}

fn default_max_in_flight_calls() -> usize {
    1
}

fn default_backoff_base() -> u64 {
    2
}

fn default_backoff_max() -> u64 {
    300
}

fn default_max_missed_heartbeats() -> u32 {
    2
}

fn default_power() -> u64 {
    7400
}

impl ChargePointConfig {
    pub fn new(cms_url: impl Into<String>, identity: ChargePointIdentity) -> Self {
        Self {
            cms_url: cms_url.into(),
            identity,
            call_timeout: default_call_timeout(),
            max_in_flight_calls: default_max_in_flight_calls(),
            reconnect_backoff_base: default_backoff_base(),
            reconnect_backoff_max: default_backoff_max(),
            max_missed_heartbeats: default_max_missed_heartbeats(),
            simulated_power_w: default_power(),
            initial_meter_wh: 0,
            default_ocpp_configs: Vec::new(),
            seed: 0,
            vendor_status_notification: false,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let identity = &self.identity;
        for (name, value) in [
            ("charge_point_id", &identity.charge_point_id),
            ("vendor", &identity.vendor),
            ("model", &identity.model),
            ("serial_number", &identity.serial_number),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingIdentity(name));
            }
        }
        if !(self.cms_url.starts_with("ws://") || self.cms_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidUrl(self.cms_url.clone()));
        }
        Ok(())
    }

    /// OCPP-J addresses a charge point by appending its id to the endpoint.
    pub fn connect_url(&self) -> String {
        format!(
            "{}/{}",
            self.cms_url.trim_end_matches('/'),
            self.identity.charge_point_id
        )
    }

    pub(crate) fn boot_request(&self) -> BootNotificationRequest {
        BootNotificationRequest {
            charge_point_vendor: self.identity.vendor.clone(),
            charge_point_model: self.identity.model.clone(),
            charge_point_serial_number: Some(self.identity.serial_number.clone()),
            charge_box_serial_number: None,
            firmware_version: self.identity.firmware_version.clone(),
            iccid: None,
            imsi: None,
            meter_type: None,
            meter_serial_number: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> ChargePointIdentity {
        ChargePointIdentity {
            charge_point_id: "CP-1".into(),
            vendor: "Sim".into(),
            model: "S1".into(),
            serial_number: "0001".into(),
            firmware_version: None,
        }
    }

    #[test]
    fn minimal_document_gets_defaults() {
        let raw = r#"{
            "cms_url": "ws://localhost:9000/ocpp/",
            "identity": {"charge_point_id": "CP-1", "vendor": "Sim", "model": "S1", "serial_number": "0001"}
        }"#;
        let config = ChargePointConfig::from_json(raw).unwrap();
        assert_eq!(config.call_timeout, 30);
        assert_eq!(config.max_in_flight_calls, 1);
        assert_eq!(config.connect_url(), "ws://localhost:9000/ocpp/CP-1");
    }

    #[test]
    fn blank_identity_field_is_fatal() {
        let mut config = ChargePointConfig::new("ws://localhost", identity());
        config.identity.vendor = "  ".into();
        assert!(matches!(config.validate(), Err(ConfigError::MissingIdentity("vendor"))));
    }

    #[test]
    fn missing_identity_field_fails_to_parse() {
        let raw = r#"{"cms_url": "ws://x", "identity": {"charge_point_id": "CP-1", "vendor": "Sim", "model": "S1"}}"#;
        assert!(matches!(ChargePointConfig::from_json(raw), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn non_websocket_url_is_rejected() {
        let config = ChargePointConfig::new("http://localhost", identity());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));
    }
}
