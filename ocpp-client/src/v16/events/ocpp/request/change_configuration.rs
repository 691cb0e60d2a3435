use cpsim_core::v16::{
    messages::{ChangeConfigurationRequest, ChangeConfigurationResponse},
    types::ConfigurationStatus,
};

use crate::v16::{
    cp::core::ChargePointCore, drivers::ui::UiAdapter, state_machine::config::OcppConfig,
};

macro_rules! gen_change_ocpp_match {
    ($this:ident, $key:expr, { $($key_str:literal => $field:ident),+ }, $raw:expr) => {
        match $key {
            $(
                $key_str => $this.config_update_helper(|s| &mut s.configs.$field, $raw),
            )+
            _ => Err(ConfigurationStatus::NotSupported),
        }
    };
}

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn change_configuration_ocpp(
        &mut self,
        unique_id: String,
        req: ChangeConfigurationRequest,
    ) {
        let key = req.key.as_str();
        let value = req.value.as_str();
        let status = match config_key_map!(gen_change_ocpp_match, self, key, value) {
            Ok(()) => ConfigurationStatus::Accepted,
            Err(status) => status,
        };
        log::info!("ChangeConfiguration {}={}: {:?}", key, value, status);
        self.reply(unique_id, Ok(ChangeConfigurationResponse { status }));
        if status != ConfigurationStatus::Accepted {
            return;
        }
        self.configs.sync_linked(key);
        match key {
            "HeartbeatInterval" => self.reschedule_heartbeat(),
            "MeterValueSampleInterval" => self.reschedule_meters(),
            _ => {}
        }
    }

    fn config_update_helper<T>(
        &mut self,
        accessor: fn(&mut Self) -> &mut OcppConfig<T>,
        raw: &str,
    ) -> Result<(), ConfigurationStatus> {
        let cfg = accessor(self);
        if !cfg.write {
            return Err(ConfigurationStatus::Rejected);
        }
        let value = cfg.parse(raw).ok_or(ConfigurationStatus::Rejected)?;
        cfg.update(value);
        Ok(())
    }
}
