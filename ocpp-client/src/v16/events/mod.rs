pub(crate) mod ocpp;
pub(crate) mod timeouts;
pub(crate) mod user;
pub(crate) mod websocket;
