//! Request and confirmation payloads, grouped by who initiates them.

mod configuration;
mod remote;
mod session;
mod transaction;

pub use configuration::*;
pub use remote::*;
pub use session::*;
pub use transaction::*;
