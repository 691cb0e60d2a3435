pub(crate) mod shutdown;
pub(crate) mod timers;
pub(crate) mod ui;
pub(crate) mod user_input;
pub(crate) mod websocket;
