pub(crate) mod actions;
pub(crate) mod boot;
pub(crate) mod call;
pub(crate) mod clock;
pub(crate) mod connector;
pub(crate) mod heartbeat;
pub(crate) mod meter;
pub(crate) mod session;
pub(crate) mod transaction;
pub(crate) mod vendor;
#[macro_use]
pub(crate) mod config;
pub(crate) mod rng;
