//! Continuations for Calls the charge point initiated.

pub(crate) mod authorize;
pub(crate) mod boot_notification;
pub(crate) mod data_transfer;
pub(crate) mod heartbeat;
pub(crate) mod meter_values;
pub(crate) mod start_transaction;
pub(crate) mod status_notification;
pub(crate) mod stop_transaction;
