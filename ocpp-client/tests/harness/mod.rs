#![allow(dead_code)]

pub mod sans_io;
pub mod ui;
pub mod ws;

use std::sync::Once;

use cpsim_client::v16::{ChargePointConfig, ChargePointIdentity};
use log::LevelFilter;

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(LevelFilter::Trace)
            .try_init()
            .ok();
    });
}

pub const CMS_URL: &str = "ws://localhost:9000/ocpp";
pub const CHARGE_POINT_ID: &str = "CP001";
pub const VENDOR: &str = "SimVendor";

pub fn identity() -> ChargePointIdentity {
    ChargePointIdentity {
        charge_point_id: CHARGE_POINT_ID.to_string(),
        vendor: VENDOR.to_string(),
        model: "SIM-1".to_string(),
        serial_number: "SN-0001".to_string(),
        firmware_version: Some("1.0.0".to_string()),
    }
}

/// Two connectors, heartbeats every 30s and meter ticks every 10s.
pub fn test_config(overrides: Vec<(&str, &str)>) -> ChargePointConfig {
    let mut config = ChargePointConfig::new(CMS_URL, identity());
    config.seed = 7;
    config.call_timeout = 10;
    config.simulated_power_w = 3600;
    config.default_ocpp_configs = [
        ("NumberOfConnectors", "2"),
        ("HeartbeatInterval", "30"),
        ("MeterValueSampleInterval", "10"),
        ("TransactionMessageRetryInterval", "5"),
    ]
    .into_iter()
    .chain(overrides)
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    config
}
