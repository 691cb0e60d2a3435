use cpsim_core::v16::{
    messages::{GetConfigurationRequest, GetConfigurationResponse},
    protocol_error::ProtocolError,
    types::KeyValue,
};

use crate::v16::{
    cp::core::ChargePointCore,
    drivers::ui::UiAdapter,
    events::websocket::CommandError,
    state_machine::config::{OcppConfig, OcppConfigs},
};

macro_rules! gen_get_ocpp_match {
    ($this:ident, $key:expr, { $($key_str:literal => $field:ident),+ }) => {
        match $key {
            $(
                $key_str => Some($this.config_get_helper(|s| &s.configs.$field)),
            )+
            _ => None,
        }
    };
}

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn get_configuration_ocpp(&mut self, unique_id: String, req: GetConfigurationRequest) {
        let max_keys = self.configs.get_configuration_max_keys.value;
        let requested = req.key.unwrap_or_default();
        if requested.len() > max_keys {
            let err = CommandError::new(
                ProtocolError::OccurrenceConstraintViolation,
                format!("at most {} keys per request", max_keys),
            );
            return self.reply::<GetConfigurationResponse>(unique_id, Err(err));
        }
        let keys = if requested.is_empty() {
            OcppConfigs::keys().map(str::to_string).collect()
        } else {
            requested
        };
        let mut configuration_key = Vec::new();
        let mut unknown_key = Vec::new();
        for key in keys {
            match config_key_map!(gen_get_ocpp_match, self, key.as_str()) {
                Some(value) => configuration_key.push(value),
                None => unknown_key.push(key),
            }
        }
        let payload = GetConfigurationResponse {
            configuration_key: (!configuration_key.is_empty()).then_some(configuration_key),
            unknown_key: (!unknown_key.is_empty()).then_some(unknown_key),
        };
        self.reply(unique_id, Ok(payload));
    }

    fn config_get_helper<T>(&self, accessor: fn(&Self) -> &OcppConfig<T>) -> KeyValue {
        let cfg = accessor(self);
        KeyValue {
            key: cfg.key.clone(),
            readonly: !cfg.write,
            value: cfg.read.then(|| cfg.raw.clone()),
        }
    }
}
