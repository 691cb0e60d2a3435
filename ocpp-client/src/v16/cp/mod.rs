pub(crate) mod config;
pub(crate) mod core;
#[cfg(feature = "async")]
pub(crate) mod r#async;
