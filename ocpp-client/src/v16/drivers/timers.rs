#[cfg(feature = "async")]
use core::{future::Future, pin::Pin, task::{Context, Poll}};

#[cfg(feature = "tokio_timer")]
use {std::collections::{BTreeSet, HashMap}, std::time::Duration, tokio::time::{Instant, Sleep}};

#[derive(Eq, Hash, Clone, Copy, PartialEq, PartialOrd, Ord, Debug)]
pub enum TimerId {
    Boot,
    Heartbeat,
    /// Earliest outstanding Call deadline.
    CallTimeout,
    Reconnect,
    TransactionRetry,
    MeterSample(usize),
}

#[cfg(feature = "async")]
pub trait TimerManager: Send + Unpin + 'static {
    fn add_or_update_timeout(&mut self, id: TimerId, timeout_secs: u64);
    fn remove_timeout(&mut self, id: TimerId);
    fn remove_all_timeouts(&mut self);
    fn poll_timeout(&mut self, cx: &mut Context<'_>) -> Poll<TimerId>;
}

#[cfg(feature = "async")]
pub(crate) struct TimerDriver<T: TimerManager> {
    timer: T,
}

#[cfg(feature = "async")]
impl<T: TimerManager> TimerDriver<T> {
    pub fn new(timer: T) -> Self {
        Self { timer }
    }

    pub fn add_or_update(&mut self, id: TimerId, timeout_secs: u64) {
        self.timer.add_or_update_timeout(id, timeout_secs);
    }

    pub fn remove_timeout(&mut self, id: TimerId) {
        self.timer.remove_timeout(id);
    }

    pub fn remove_all_timeouts(&mut self) {
        self.timer.remove_all_timeouts();
    }
}

#[cfg(feature = "async")]
impl<T: TimerManager> Future for TimerDriver<T> {
    type Output = TimerId;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.timer.poll_timeout(cx)
    }
}

/// One-shot timers on the tokio clock, so paused test time drives them too.
#[cfg(feature = "tokio_timer")]
pub struct TokioTimerManager {
    timer_deadlines: HashMap<TimerId, Instant>,
    deadline_queue: BTreeSet<(Instant, TimerId)>,
    active_sleep: Option<(Pin<Box<Sleep>>, TimerId)>,
    needs_reschedule: bool,
}

#[cfg(feature = "tokio_timer")]
impl TokioTimerManager {
    pub fn new() -> Self {
        Self {
            timer_deadlines: HashMap::new(),
            deadline_queue: BTreeSet::new(),
            active_sleep: None,
            needs_reschedule: false,
        }
    }

    fn next_deadline(&self) -> Option<(Instant, TimerId)> {
        self.deadline_queue.iter().next().copied()
    }
}

#[cfg(feature = "tokio_timer")]
impl Default for TokioTimerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "tokio_timer")]
impl TimerManager for TokioTimerManager {
    fn add_or_update_timeout(&mut self, id: TimerId, timeout_secs: u64) {
        let when = Instant::now() + Duration::from_secs(timeout_secs);
        if let Some(prev) = self.timer_deadlines.insert(id, when) {
            self.deadline_queue.remove(&(prev, id));
        }
        self.deadline_queue.insert((when, id));
        self.needs_reschedule = true;
    }

    fn remove_timeout(&mut self, id: TimerId) {
        if let Some(when) = self.timer_deadlines.remove(&id) {
            self.deadline_queue.remove(&(when, id));
            self.needs_reschedule = true;
        }
    }

    fn remove_all_timeouts(&mut self) {
        self.timer_deadlines.clear();
        self.deadline_queue.clear();
        self.active_sleep = None;
        self.needs_reschedule = false;
    }

    fn poll_timeout(&mut self, cx: &mut Context<'_>) -> Poll<TimerId> {
        if self.needs_reschedule {
            self.needs_reschedule = false;
            self.active_sleep = self
                .next_deadline()
                .map(|(when, id)| (Box::pin(tokio::time::sleep_until(when)), id));
        }
        let (sleep, id) = match self.active_sleep.as_mut() {
            Some(t) => t,
            None => return Poll::Pending,
        };
        match sleep.as_mut().poll(cx) {
            Poll::Ready(()) => {
                let id = *id;
                if let Some(when) = self.timer_deadlines.remove(&id) {
                    self.deadline_queue.remove(&(when, id));
                }
                self.active_sleep = None;
                self.needs_reschedule = true;
                Poll::Ready(id)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
