use core::str::FromStr;

use cpsim_core::v16::types::Measurand;

use crate::v16::cp::config::ConfigError;

pub(crate) struct OcppConfig<T> {
    pub key: String,
    pub raw: String,
    pub value: T,
    pub read: bool,
    pub write: bool,
    pub parser_fn: fn(&str) -> Option<T>,
    pub format_fn: fn(&T) -> String,
    pub validator: Option<fn(&T) -> bool>,
}

impl<T> OcppConfig<T> {
    pub fn new() -> Self
    where
        T: Default,
    {
        Self {
            key: String::new(),
            raw: String::new(),
            value: T::default(),
            read: false,
            write: false,
            parser_fn: |_| None,
            format_fn: |_| String::new(),
            validator: None,
        }
    }
    pub fn with_std(mut self) -> Self
    where
        T: ToString + FromStr,
    {
        self.parser_fn = |s| s.trim().parse().ok();
        self.format_fn = |v| v.to_string();
        self
    }
    pub fn with_parse(mut self, parser_fn: fn(&str) -> Option<T>) -> Self {
        self.parser_fn = parser_fn;
        self
    }
    pub fn with_format_fn(mut self, format_fn: fn(&T) -> String) -> Self {
        self.format_fn = format_fn;
        self
    }
    pub fn with_validator(mut self, validator: fn(&T) -> bool) -> Self {
        self.validator = Some(validator);
        self
    }
    pub fn read(mut self) -> Self {
        self.read = true;
        self
    }
    pub fn write(mut self) -> Self {
        self.write = true;
        self
    }
    /// Parses and validates `raw` without applying it.
    pub fn parse(&self, raw: &str) -> Option<T> {
        let value = (self.parser_fn)(raw)?;
        match self.validator {
            Some(validator) if !validator(&value) => None,
            _ => Some(value),
        }
    }
    pub fn update(&mut self, value: T) {
        self.raw = (self.format_fn)(&value);
        self.value = value;
    }
}

macro_rules! config_key_map {
    ($macro:ident, $this:ident, $key:expr $(, $args:tt)*) => {
        $macro!($this, $key, {
            "HeartbeatInterval" => heartbeat_interval,
            "MeterValueSampleInterval" => meter_value_sample_interval,
            "AuthorizeRequired" => authorize_required,
            "AuthorizeRemoteTxRequests" => authorize_remote_transaction_requests,
            "NumberOfConnectors" => number_of_connectors,
            "TransactionMessageAttempts" => transaction_message_attempts,
            "TransactionMessageRetryInterval" => transaction_message_retry_interval,
            "MeterValuesSampledData" => meter_values_sampled_data,
            "GetConfigurationMaxKeys" => get_configuration_max_keys,
            "SupportedFeatureProfiles" => supported_feature_profiles,
            "evb_AutoStart" => auto_start
        } $(, $args)*)
    };
}

macro_rules! gen_init_match {
    ($this:ident, $key:expr, { $($key_str:literal => $field:ident),+ }, $raw:expr) => {
        match $key {
            $(
                $key_str => $this.init_config(|s| &mut s.$field, $key, $raw),
            )+
            _ => Err(ConfigError::UnknownKey($key.to_string())),
        }
    };
}

const DEFAULTS: &[(&str, &str)] = &[
    ("HeartbeatInterval", "900"),
    ("MeterValueSampleInterval", "60"),
    ("AuthorizeRequired", "true"),
    ("AuthorizeRemoteTxRequests", "true"),
    ("NumberOfConnectors", "1"),
    ("TransactionMessageAttempts", "3"),
    ("TransactionMessageRetryInterval", "10"),
    ("MeterValuesSampledData", "Energy.Active.Import.Register,Power.Active.Import"),
    ("GetConfigurationMaxKeys", "20"),
    ("SupportedFeatureProfiles", "Core"),
    ("evb_AutoStart", "0"),
];

/// Measurands the simulated meter can actually produce.
const SAMPLEABLE: [Measurand; 2] = [
    Measurand::EnergyActiveImportRegister,
    Measurand::PowerActiveImport,
];

fn parse_measurands(raw: &str) -> Option<Vec<Measurand>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| serde_json::from_value::<Measurand>(serde_json::Value::String(s.to_string())).ok())
        .collect()
}

/// Vendor flags come as `1`/`0` as often as `true`/`false`.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn format_measurands(values: &Vec<Measurand>) -> String {
    values
        .iter()
        .map(Measurand::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) struct OcppConfigs {
    pub heartbeat_interval: OcppConfig<u64>,
    pub meter_value_sample_interval: OcppConfig<u64>,
    pub authorize_required: OcppConfig<bool>,
    pub authorize_remote_transaction_requests: OcppConfig<bool>,
    pub number_of_connectors: OcppConfig<usize>,
    pub transaction_message_attempts: OcppConfig<u64>,
    pub transaction_message_retry_interval: OcppConfig<u64>,
    pub meter_values_sampled_data: OcppConfig<Vec<Measurand>>,
    pub get_configuration_max_keys: OcppConfig<usize>,
    pub supported_feature_profiles: OcppConfig<String>,
    /// Vendor view of `AuthorizeRequired`, inverted: `1` starts without Authorize.
    pub auto_start: OcppConfig<bool>,
}

impl OcppConfigs {
    fn new() -> Self {
        Self {
            heartbeat_interval: OcppConfig::<u64>::new().with_std().read().write(),
            meter_value_sample_interval: OcppConfig::<u64>::new().with_std().read().write(),
            authorize_required: OcppConfig::<bool>::new().with_std().read().write(),
            authorize_remote_transaction_requests: OcppConfig::<bool>::new()
                .with_std()
                .read()
                .write(),
            number_of_connectors: OcppConfig::<usize>::new()
                .with_std()
                .with_validator(|n| *n > 0)
                .read(),
            transaction_message_attempts: OcppConfig::<u64>::new()
                .with_std()
                .with_validator(|n| *n > 0)
                .read()
                .write(),
            transaction_message_retry_interval: OcppConfig::<u64>::new().with_std().read().write(),
            meter_values_sampled_data: OcppConfig::<Vec<Measurand>>::new()
                .with_parse(parse_measurands)
                .with_format_fn(format_measurands)
                .with_validator(|v| !v.is_empty() && v.iter().all(|m| SAMPLEABLE.contains(m)))
                .read()
                .write(),
            get_configuration_max_keys: OcppConfig::<usize>::new().with_std().read(),
            supported_feature_profiles: OcppConfig::<String>::new().with_std().read(),
            auto_start: OcppConfig::<bool>::new()
                .with_parse(parse_flag)
                .with_format_fn(|v| String::from(if *v { "1" } else { "0" }))
                .read()
                .write(),
        }
    }

    /// Defaults first, then `overrides` in order.
    pub fn build(overrides: &[(String, String)]) -> Result<Self, ConfigError> {
        let mut configs = Self::new();
        let defaults = DEFAULTS.iter().map(|(key, raw)| (*key, *raw));
        let overrides = overrides.iter().map(|(key, raw)| (key.as_str(), raw.as_str()));
        for (key, raw) in defaults.chain(overrides) {
            config_key_map!(gen_init_match, configs, key, raw)?;
            configs.sync_linked(key);
        }
        Ok(configs)
    }

    /// Keeps `AuthorizeRequired` and `evb_AutoStart` opposite after either changed.
    pub fn sync_linked(&mut self, key: &str) {
        match key {
            "AuthorizeRequired" => self.auto_start.update(!self.authorize_required.value),
            "evb_AutoStart" => self.authorize_required.update(!self.auto_start.value),
            _ => {}
        }
    }

    /// Every known key, in a stable order.
    pub fn keys() -> impl Iterator<Item = &'static str> {
        DEFAULTS.iter().map(|(key, _)| *key)
    }

    fn init_config<T>(
        &mut self,
        accessor: fn(&mut Self) -> &mut OcppConfig<T>,
        key: &str,
        raw: &str,
    ) -> Result<(), ConfigError> {
        let cfg = accessor(self);
        let value = cfg.parse(raw).ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        })?;
        cfg.key = key.to_string();
        cfg.update(value);
        Ok(())
    }
}
