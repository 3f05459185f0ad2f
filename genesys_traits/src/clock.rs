use std::thread;
use std::time::{Duration, Instant};

/// Monotonic clock used for device polling and calibration ageing.
///
/// - now(): returns a monotonic Instant
/// - sleep(): blocks for the provided duration (implementations may simulate)
/// - ms_since(): elapsed milliseconds from an epoch Instant
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        dur.as_millis() as u64
    }
}

/// Default, real-time monotonic clock backed by std::time::Instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

/// Deterministic clock whose time only moves on `sleep`/`advance`.
///
/// Shared between clones, so a test can keep a handle while the device
/// under test owns another one.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    state: std::sync::Arc<std::sync::Mutex<ManualState>>,
}

#[derive(Debug, Default)]
struct ManualState {
    offset: Duration,
    sleeps: u64,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: std::sync::Arc::new(std::sync::Mutex::new(ManualState::default())),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, d: Duration) {
        if let Ok(mut st) = self.state.lock() {
            st.offset = st.offset.saturating_add(d);
        }
    }

    /// Number of `sleep` calls observed so far.
    pub fn sleeps(&self) -> u64 {
        self.state.lock().map(|st| st.sleeps).unwrap_or(0)
    }

    /// Total simulated time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        self.state
            .lock()
            .map(|st| st.offset)
            .unwrap_or(Duration::ZERO)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, d: Duration) {
        if let Ok(mut st) = self.state.lock() {
            st.offset = st.offset.saturating_add(d);
            st.sleeps = st.sleeps.saturating_add(1);
        }
    }
}
