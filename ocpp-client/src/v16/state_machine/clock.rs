use core::time::Duration;

use chrono::{DateTime, Utc};

use crate::v16::{cp::core::ChargePointCore, drivers::ui::UiAdapter};

/// Monotonic microseconds as reported by the UI adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Instant(pub(crate) u128);

impl Instant {
    pub fn duration_since(self, other: Self) -> Duration {
        Duration::from_micros(u64::try_from(self.0.saturating_sub(other.0)).unwrap_or(u64::MAX))
    }
    pub fn add_secs(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs as u128 * 1_000_000))
    }
    pub fn as_micros(self) -> u128 {
        self.0
    }
}

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn now(&self) -> Instant {
        Instant(self.ui.get_boot_time())
    }
    /// Wall clock derived from the last `currentTime` the server reported.
    pub(crate) fn get_time(&self) -> Option<DateTime<Utc>> {
        self.get_time_since(self.now())
    }
    pub(crate) fn get_time_since(&self, t: Instant) -> Option<DateTime<Utc>> {
        self.base_time
            .map(|(base_dt, base_instant)| base_dt + t.duration_since(base_instant))
    }
    pub(crate) fn set_time(&mut self, dt: DateTime<Utc>) {
        self.base_time = Some((dt, self.now()));
    }
    pub(crate) fn timestamp(&self) -> DateTime<Utc> {
        self.get_time().unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}
