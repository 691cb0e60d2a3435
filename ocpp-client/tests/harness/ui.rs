use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use cpsim_client::v16::{StateEvent, UiAdapter};

/// Records published events. Time only moves when the test says so.
#[derive(Clone, Default)]
pub struct MockUi {
    clock_us: Arc<AtomicU64>,
    events: Arc<Mutex<Vec<StateEvent>>>,
}

impl MockUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_secs(&self) -> u64 {
        self.clock_us.load(Ordering::SeqCst) / 1_000_000
    }

    pub fn set_secs(&self, secs: u64) {
        self.clock_us.store(secs * 1_000_000, Ordering::SeqCst);
    }

    pub fn take_events(&self) -> Vec<StateEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl UiAdapter for MockUi {
    fn get_boot_time(&self) -> u128 {
        self.clock_us.load(Ordering::SeqCst) as u128
    }

    fn publish(&mut self, event: StateEvent) {
        log::debug!("ui event: {:?}", event);
        self.events.lock().unwrap().push(event);
    }
}

/// Follows the tokio clock so paused time drives the core as well.
pub struct TokioClockUi {
    started: tokio::time::Instant,
    tx: flume::Sender<StateEvent>,
}

impl TokioClockUi {
    pub fn new() -> (Self, flume::Receiver<StateEvent>) {
        let (tx, rx) = flume::unbounded();
        (
            Self {
                started: tokio::time::Instant::now(),
                tx,
            },
            rx,
        )
    }
}

impl UiAdapter for TokioClockUi {
    fn get_boot_time(&self) -> u128 {
        self.started.elapsed().as_micros()
    }

    fn publish(&mut self, event: StateEvent) {
        let _ = self.tx.send(event);
    }
}
