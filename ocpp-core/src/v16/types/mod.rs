mod authorization;
mod configuration;
mod connector;
mod metering;
mod registration;
mod remote;

pub use authorization::*;
pub use configuration::*;
pub use connector::*;
pub use metering::*;
pub use registration::*;
pub use remote::*;
