use cpsim_core::v16::types::{AuthorizationStatus, ChargePointErrorCode, ChargePointStatus, RegistrationStatus};

use crate::v16::state_machine::{session::SessionState, transaction::Transaction};

#[cfg(feature = "flume_channels")]
use flume::Sender;

/// State changes published for rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    Connector {
        connector_id: usize,
        status: ChargePointStatus,
        error_code: ChargePointErrorCode,
        transaction_id: Option<i32>,
        meter_value: Option<u64>,
    },
    Registration {
        registration_state: RegistrationStatus,
        session_state: SessionState,
    },
    /// `status` is `None` when the Authorize exchange itself failed.
    AuthorizationDenied {
        connector_id: usize,
        id_tag: String,
        status: Option<AuthorizationStatus>,
    },
    TransactionEnded {
        connector_id: usize,
        transaction: Transaction,
    },
    IntentRejected {
        connector_id: usize,
        reason: String,
    },
    ProtocolAnomaly {
        description: String,
    },
}

/// Presentation side of the simulator. Also the source of monotonic time.
pub trait UiAdapter: Send + 'static {
    /// Microseconds since an arbitrary fixed origin. Must never go backwards.
    fn get_boot_time(&self) -> u128;
    fn publish(&mut self, event: StateEvent);
}

#[cfg(feature = "flume_channels")]
pub struct FlumeUiAdapter {
    started: std::time::Instant,
    tx: Sender<StateEvent>,
}

#[cfg(feature = "flume_channels")]
impl FlumeUiAdapter {
    pub fn new(tx: Sender<StateEvent>) -> Self {
        Self {
            started: std::time::Instant::now(),
            tx,
        }
    }
}

#[cfg(feature = "flume_channels")]
impl UiAdapter for FlumeUiAdapter {
    fn get_boot_time(&self) -> u128 {
        self.started.elapsed().as_micros()
    }

    fn publish(&mut self, event: StateEvent) {
        if self.tx.send(event).is_err() {
            log::trace!("ui receiver dropped");
        }
    }
}
