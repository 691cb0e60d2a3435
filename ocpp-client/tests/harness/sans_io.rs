use std::collections::{BTreeMap, VecDeque};

use chrono::{TimeZone, Utc};
use cpsim_client::v16::{
    ChargePointConfig, ChargePointCore, CoreActions, SessionState, StateEvent, TimerId,
};
use cpsim_core::{
    format::{
        frame::{Call, CallError, CallResult, Frame},
        message::EncodeDecode,
    },
    v16::{
        messages::{BootNotificationResponse, StatusNotificationRequest, StatusNotificationResponse},
        protocol_error::ProtocolError,
        types::{ChargePointStatus, RegistrationStatus},
    },
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::{init_logger, test_config, ui::MockUi};

/// Drives a [`ChargePointCore`] by hand: a fake transport, a fake timer
/// wheel and a clock that only moves on request.
pub struct CoreHarness {
    pub cp: ChargePointCore<MockUi>,
    pub ui: MockUi,
    pub outbox: VecDeque<String>,
    pub timers: BTreeMap<TimerId, u64>,
    pub connects: Vec<String>,
    pub closes: usize,
    next_uid: u64,
}

impl CoreHarness {
    pub fn new(overrides: Vec<(&str, &str)>) -> Self {
        Self::with_config(test_config(overrides))
    }

    pub fn with_config(config: ChargePointConfig) -> Self {
        init_logger();
        let ui = MockUi::new();
        let cp = ChargePointCore::new(ui.clone(), config).unwrap();
        Self {
            cp,
            ui,
            outbox: VecDeque::new(),
            timers: BTreeMap::new(),
            connects: Vec::new(),
            closes: 0,
            next_uid: 0,
        }
    }

    pub fn apply(&mut self, actions: Vec<CoreActions>) {
        let now = self.ui.now_secs();
        for action in actions {
            match action {
                CoreActions::Connect(url) => self.connects.push(url),
                CoreActions::SendWsMsg(msg) => {
                    log::info!("[MSG_OUT] {}", msg);
                    self.outbox.push_back(msg);
                }
                CoreActions::CloseConnection => self.closes += 1,
                CoreActions::AddTimeout(id, secs) => {
                    self.timers.insert(id, now + secs);
                }
                CoreActions::RemoveTimeout(id) => {
                    self.timers.remove(&id);
                }
                CoreActions::RemoveAllTimeouts => self.timers.clear(),
            }
        }
    }

    pub fn start(&mut self) {
        let actions = self.cp.start();
        self.apply(actions);
    }

    pub fn connected(&mut self) {
        let actions = self.cp.ws_connected();
        self.apply(actions);
    }

    pub fn disconnected(&mut self) {
        let actions = self.cp.ws_disconnected();
        self.apply(actions);
    }

    /// Moves the clock forward, firing due timers in deadline order.
    pub fn advance(&mut self, secs: u64) {
        let target = self.ui.now_secs() + secs;
        loop {
            let due = self
                .timers
                .iter()
                .filter(|(_, at)| **at <= target)
                .min_by_key(|(id, at)| (**at, **id))
                .map(|(id, at)| (*id, *at));
            let Some((id, at)) = due else {
                break;
            };
            self.timers.remove(&id);
            self.ui.set_secs(at);
            let actions = self.cp.handle_timeout(id);
            self.apply(actions);
        }
        self.ui.set_secs(target);
    }

    pub fn timer(&self, id: TimerId) -> Option<u64> {
        self.timers.get(&id).map(|at| at - self.ui.now_secs())
    }

    pub fn next_frame(&mut self) -> Frame<ProtocolError> {
        let msg = self.outbox.pop_front().expect("no frame was sent");
        Frame::decode(&msg).unwrap()
    }

    /// Pops the next outbound frame, which must be a Call for `action`.
    pub fn expect_call<T: DeserializeOwned>(&mut self, action: &str) -> (String, T) {
        match self.next_frame() {
            Frame::Call(call) => {
                assert_eq!(call.action, action, "unexpected call {:?}", call);
                (call.unique_id, serde_json::from_value(call.payload).unwrap())
            }
            other => panic!("expected {} call, got {:?}", action, other),
        }
    }

    pub fn expect_result<T: DeserializeOwned>(&mut self, unique_id: &str) -> T {
        match self.next_frame() {
            Frame::CallResult(res) => {
                assert_eq!(res.unique_id, unique_id);
                serde_json::from_value(res.payload).unwrap()
            }
            other => panic!("expected result for {}, got {:?}", unique_id, other),
        }
    }

    pub fn expect_error(&mut self, unique_id: &str) -> ProtocolError {
        match self.next_frame() {
            Frame::CallError(err) => {
                assert_eq!(err.unique_id, unique_id);
                err.error_code
            }
            other => panic!("expected error for {}, got {:?}", unique_id, other),
        }
    }

    pub fn expect_silence(&self) {
        assert!(self.outbox.is_empty(), "unexpected frames: {:?}", self.outbox);
    }

    pub fn inject(&mut self, msg: String) {
        log::info!("[MSG_IN] {}", msg);
        let actions = self.cp.got_ws_msg(msg);
        self.apply(actions);
    }

    pub fn respond<T: Serialize>(&mut self, unique_id: &str, payload: T) {
        self.inject(CallResult::new(unique_id.to_string(), payload).encode());
    }

    pub fn respond_error(&mut self, unique_id: &str, code: ProtocolError) {
        self.inject(CallError::new(unique_id.to_string(), code).encode());
    }

    /// Sends a server-initiated Call and returns its unique id.
    pub fn send_call<T: Serialize>(&mut self, action: &str, payload: T) -> String {
        self.next_uid += 1;
        let unique_id = format!("cs-{}", self.next_uid);
        self.inject(Call::new(unique_id.clone(), action, payload).encode());
        unique_id
    }

    pub fn send_raw_call(&mut self, action: &str, payload: Value) -> String {
        self.send_call(action, payload)
    }

    pub fn boot_response(status: RegistrationStatus, interval: u64) -> BootNotificationResponse {
        BootNotificationResponse {
            status,
            current_time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            interval,
        }
    }

    /// Connects, answers the boot with Accepted and acknowledges the
    /// initial StatusNotifications.
    pub fn boot_accepted(&mut self, interval: u64) {
        self.start();
        self.connected();
        let (uid, _) = self.expect_call::<Value>("BootNotification");
        self.respond(&uid, Self::boot_response(RegistrationStatus::Accepted, interval));
        assert_eq!(self.cp.session_state(), SessionState::Registered);
        for _ in 0..2 {
            self.ack_status(ChargePointStatus::Available);
        }
        self.expect_silence();
        self.ui.take_events();
    }

    /// Expects a StatusNotification with `status` and acknowledges it.
    pub fn ack_status(&mut self, status: ChargePointStatus) -> StatusNotificationRequest {
        let (uid, req) = self.expect_call::<StatusNotificationRequest>("StatusNotification");
        assert_eq!(req.status, status, "{:?}", req);
        self.respond(&uid, StatusNotificationResponse {});
        req
    }

    pub fn events(&mut self) -> Vec<StateEvent> {
        self.ui.take_events()
    }
}
