mod cp;
mod drivers;
#[macro_use]
mod state_machine;
mod events;

pub use cp::{
    config::{ChargePointConfig, ChargePointIdentity, ConfigError},
    core::{ChargePointCore, OcppError},
};
pub use drivers::{
    timers::TimerId,
    ui::{StateEvent, UiAdapter},
    user_input::UserIntent,
    websocket::TransportError,
};
pub use state_machine::{
    actions::CoreActions, call::CorrelationError, session::SessionState,
    transaction::Transaction,
};

#[cfg(feature = "async")]
pub use cp::r#async::ChargePointAsync as ChargePoint;

#[cfg(feature = "async")]
pub use drivers::{
    shutdown::ShutdownSignal,
    timers::TimerManager,
    user_input::UserInput,
    websocket::{WebsocketResponse, WebsocketTransport},
};

#[cfg(feature = "tokio_timer")]
pub use drivers::timers::TokioTimerManager;

#[cfg(feature = "tokio_ws")]
pub use drivers::websocket::TokioWsClient;

#[cfg(feature = "flume_channels")]
pub use drivers::{ui::FlumeUiAdapter, user_input::FlumeUserInput};

#[cfg(feature = "tokio_shutdown")]
pub use drivers::shutdown::TokioShutdown;
