//! Handlers for Calls initiated by the central system.

pub(crate) mod change_availability;
pub(crate) mod change_configuration;
pub(crate) mod data_transfer;
pub(crate) mod get_configuration;
pub(crate) mod remote_start_transaction;
pub(crate) mod remote_stop_transaction;
pub(crate) mod reset;
pub(crate) mod unlock_connector;
