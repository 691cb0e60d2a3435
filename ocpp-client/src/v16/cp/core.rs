use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use cpsim_core::{
    format::frame::Call,
    v16::{
        protocol_error::ProtocolError,
        types::{ChargePointStatus, RegistrationStatus, ResetType},
    },
};
use rand::{rngs::SmallRng, SeedableRng};

use crate::v16::{
    drivers::{
        timers::TimerId,
        ui::UiAdapter,
        user_input::UserIntent,
        websocket::TransportError,
    },
    state_machine::{
        actions::CoreActions,
        boot::BootState,
        call::{CallContext, CorrelationTable},
        clock::Instant,
        config::OcppConfigs,
        connector::Connector,
        heartbeat::HeartbeatState,
        session::SessionState,
        transaction::{Transaction, TransactionEvent, TransactionEventState},
    },
};

use super::config::{ChargePointConfig, ConfigError};

pub type OcppError = cpsim_core::format::error::OcppError<ProtocolError>;

/// Sans-IO charge point. Every entry point returns the actions the caller
/// must perform, in order.
pub struct ChargePointCore<U: UiAdapter> {
    pub(crate) ui: U,
    pub(crate) config: ChargePointConfig,
    pub(crate) configs: OcppConfigs,
    pub(crate) rng: SmallRng,
    pub(crate) queued_actions: VecDeque<CoreActions>,
    pub(crate) session_state: SessionState,
    pub(crate) registration_status: RegistrationStatus,
    pub(crate) stopped: bool,
    pub(crate) reconnect_attempts: u32,
    pub(crate) boot_state: BootState,
    pub(crate) heartbeat_state: HeartbeatState,
    pub(crate) missed_heartbeats: u32,
    pub(crate) last_contact: Option<Instant>,
    pub(crate) base_time: Option<(DateTime<Utc>, Instant)>,
    pub(crate) pending_calls: CorrelationTable<CallContext>,
    pub(crate) outbound_calls: VecDeque<(Call, CallContext)>,
    pub(crate) connectors: Vec<Connector>,
    pub(crate) next_local_id: u32,
    pub(crate) stopping_transactions: BTreeMap<u32, (usize, Transaction)>,
    pub(crate) transaction_queue: VecDeque<TransactionEvent>,
    pub(crate) transaction_event_state: TransactionEventState,
    pub(crate) transaction_event_retries: u64,
    pub(crate) transaction_map: HashMap<u32, i32>,
    pub(crate) pending_reset: Option<ResetType>,
}

impl<U: UiAdapter> ChargePointCore<U> {
    pub fn new(ui: U, config: ChargePointConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let configs = OcppConfigs::build(&config.default_ocpp_configs)?;
        let now = Instant(ui.get_boot_time());
        let connectors = (0..configs.number_of_connectors.value)
            .map(|_| Connector::new(config.initial_meter_wh, now))
            .collect();
        let seed = if config.seed != 0 {
            config.seed
        } else {
            now.as_micros() as u64 ^ 0x9e37_79b9_7f4a_7c15
        };
        Ok(Self {
            ui,
            rng: SmallRng::seed_from_u64(seed),
            config,
            configs,
            queued_actions: VecDeque::new(),
            session_state: SessionState::Disconnected,
            registration_status: RegistrationStatus::Pending,
            stopped: false,
            reconnect_attempts: 0,
            boot_state: BootState::Idle,
            heartbeat_state: HeartbeatState::Idle,
            missed_heartbeats: 0,
            last_contact: None,
            base_time: None,
            pending_calls: CorrelationTable::new(),
            outbound_calls: VecDeque::new(),
            connectors,
            next_local_id: 1,
            stopping_transactions: BTreeMap::new(),
            transaction_queue: VecDeque::new(),
            transaction_event_state: TransactionEventState::Idle,
            transaction_event_retries: 0,
            transaction_map: HashMap::new(),
            pending_reset: None,
        })
    }

    fn drain_actions(&mut self) -> Vec<CoreActions> {
        self.queued_actions.drain(..).collect()
    }

    pub fn start(&mut self) -> Vec<CoreActions> {
        self.start_session();
        self.drain_actions()
    }

    pub fn stop(&mut self) -> Vec<CoreActions> {
        self.stop_session();
        self.drain_actions()
    }

    pub fn ws_connected(&mut self) -> Vec<CoreActions> {
        self.on_ws_connected();
        self.drain_actions()
    }

    pub fn ws_connect_failed(&mut self, err: TransportError) -> Vec<CoreActions> {
        self.on_ws_connect_failed(err);
        self.drain_actions()
    }

    pub fn ws_disconnected(&mut self) -> Vec<CoreActions> {
        self.on_ws_disconnected();
        self.drain_actions()
    }

    pub fn ws_send_failed(&mut self, err: TransportError) -> Vec<CoreActions> {
        self.on_ws_send_failed(err);
        self.drain_actions()
    }

    pub fn got_ws_msg(&mut self, msg: String) -> Vec<CoreActions> {
        self.got_ws_msg_helper(msg);
        self.drain_actions()
    }

    pub fn handle_timeout(&mut self, id: TimerId) -> Vec<CoreActions> {
        self.handle_timeout_helper(id);
        self.drain_actions()
    }

    pub fn plug_in(&mut self, connector_id: usize, id_tag: String) -> Vec<CoreActions> {
        self.plug_in_helper(connector_id, id_tag);
        self.drain_actions()
    }

    pub fn start_charge(&mut self, connector_id: usize, id_tag: String) -> Vec<CoreActions> {
        self.start_charge_helper(connector_id, id_tag);
        self.drain_actions()
    }

    pub fn unplug(&mut self, connector_id: usize) -> Vec<CoreActions> {
        self.unplug_helper(connector_id);
        self.drain_actions()
    }

    pub fn simulate_fault(
        &mut self,
        connector_id: usize,
        error_code: Option<cpsim_core::v16::types::ChargePointErrorCode>,
    ) -> Vec<CoreActions> {
        self.simulate_fault_helper(connector_id, error_code);
        self.drain_actions()
    }

    pub fn reset_fault(&mut self, connector_id: usize) -> Vec<CoreActions> {
        self.reset_fault_helper(connector_id);
        self.drain_actions()
    }

    pub fn user_intent(&mut self, intent: UserIntent) -> Vec<CoreActions> {
        match intent {
            UserIntent::PlugIn {
                connector_id,
                id_tag,
            } => self.plug_in(connector_id, id_tag),
            UserIntent::StartCharge {
                connector_id,
                id_tag,
            } => self.start_charge(connector_id, id_tag),
            UserIntent::Unplug { connector_id } => self.unplug(connector_id),
            UserIntent::SimulateFault {
                connector_id,
                error_code,
            } => self.simulate_fault(connector_id, error_code),
            UserIntent::ResetFault { connector_id } => self.reset_fault(connector_id),
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.session_state
    }

    pub fn registration_status(&self) -> RegistrationStatus {
        self.registration_status
    }

    pub fn connector_status(&self, connector_id: usize) -> Option<ChargePointStatus> {
        self.connector(connector_id).map(|c| c.state.status())
    }

    /// The running transaction on a connector, if any.
    pub fn transaction(&self, connector_id: usize) -> Option<&Transaction> {
        self.connector(connector_id)
            .and_then(|c| c.transaction.as_ref())
    }

    pub fn meter_wh(&self, connector_id: usize) -> Option<u64> {
        self.connector(connector_id).map(|c| c.meter_wh())
    }

    pub fn pending_request_count(&self) -> usize {
        self.pending_calls.len()
    }

    /// Wall-clock time of the last successful exchange with the server.
    pub fn last_contact(&self) -> Option<DateTime<Utc>> {
        self.last_contact.and_then(|t| self.get_time_since(t))
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }
}
