//! Sliding Window Quota Tracker
//!
//! A bounded allowance that refills continuously: after consuming units,
//! capacity trickles back in proportion to elapsed time, reaching full
//! capacity after one whole window. There is no discrete reset at window
//! boundaries.
//!
//! A capacity of `0` means unlimited. That case is a separate variant with
//! no lock and no state, so the pass-through path never synchronizes.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use super::clock::{Clock, SystemClock};
use super::error::{QuotaError, Result};

/// Shared check/reset contract of every quota tracker
pub trait Limit: Send + Sync {
    /// Try to consume `needed` units right now
    ///
    /// Returns false if the units are not available. Never blocks waiting
    /// for refill.
    fn check(&self, needed: u32) -> bool;

    /// Refill to full capacity
    fn reset(&self);
}

/// Result of a detailed check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    /// Whether the units were granted
    pub allowed: bool,

    /// Whole units still grantable after this check (`u32::MAX` if unlimited)
    pub remaining: u32,

    /// Time until the same request would succeed
    ///
    /// `None` on success, and also on denial when the request exceeds the
    /// capacity and can never succeed.
    pub retry_after: Option<Duration>,
}

impl CheckOutcome {
    /// Create an allowed outcome
    pub fn allowed(remaining: u32) -> Self {
        Self {
            allowed: true,
            remaining,
            retry_after: None,
        }
    }

    /// Create a denied outcome
    pub fn denied(remaining: u32, retry_after: Option<Duration>) -> Self {
        Self {
            allowed: false,
            remaining,
            retry_after,
        }
    }
}

/// Usage statistics for a tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStats {
    /// Whether the tracker is unlimited
    pub unlimited: bool,

    /// Maximum units per window (0 if unlimited)
    pub capacity: u32,

    /// Window length in seconds (0 if unlimited)
    pub window_secs: f64,

    /// Units grantable at `captured_at` (`None` if unlimited)
    pub available: Option<f64>,

    /// Share of the capacity currently consumed
    pub utilization_percent: f64,

    /// When the snapshot was taken
    pub captured_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
struct WindowState {
    available: f64,
    last_checked: Instant,
}

impl WindowState {
    /// Allowance at `now`, capped at `capacity`
    fn projected(&self, now: Instant, capacity: f64, window_secs: f64) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_checked);
        (self.available + elapsed.as_secs_f64() * capacity / window_secs).min(capacity)
    }

    fn refill(&mut self, now: Instant, capacity: f64, window_secs: f64) {
        self.available = self.projected(now, capacity, window_secs);
        self.last_checked = now;
    }
}

/// Tracker with a real limit; owns the lock and the refill state
#[derive(Debug)]
pub struct BoundedWindow {
    capacity: f64,
    window: Duration,
    state: Mutex<WindowState>,
    clock: Arc<dyn Clock>,
}

impl BoundedWindow {
    fn new(capacity: u32, window: Duration, clock: Arc<dyn Clock>) -> Result<Self> {
        if capacity == 0 || window.is_zero() {
            return Err(QuotaError::InvalidConfiguration { capacity, window });
        }

        let now = clock.now();
        Ok(Self {
            capacity: f64::from(capacity),
            window,
            state: Mutex::new(WindowState {
                available: f64::from(capacity),
                last_checked: now,
            }),
            clock,
        })
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Recovering poisoned quota window lock");
            poisoned.into_inner()
        })
    }

    fn window_secs(&self) -> f64 {
        self.window.as_secs_f64()
    }

    /// Refill, then take `needed` if enough is available
    ///
    /// Returns `None` without touching state when `needed` exceeds the
    /// capacity, otherwise whether the units were taken and what is left.
    fn take(&self, needed: u32) -> Option<(bool, f64)> {
        let needed = f64::from(needed);
        if needed > self.capacity {
            return None;
        }

        let mut state = self.lock();
        let now = self.clock.now();
        state.refill(now, self.capacity, self.window_secs());

        if state.available < needed {
            return Some((false, state.available));
        }

        state.available -= needed;
        Some((true, state.available))
    }

    /// Time to refill from `available` up to `needed`
    fn refill_time(&self, available: f64, needed: u32) -> Duration {
        let deficit = f64::from(needed) - available;
        if deficit <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(deficit * self.window_secs() / self.capacity)
            .unwrap_or(Duration::MAX)
    }

    /// Maximum units per window
    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }

    /// Window length
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Allowance at the current instant, without updating the tracker
    pub fn available(&self) -> f64 {
        let state = self.lock();
        state.projected(self.clock.now(), self.capacity, self.window_secs())
    }

    /// Time until `needed` units would be granted
    ///
    /// Returns `None` if `needed` exceeds the capacity.
    pub fn time_until_available(&self, needed: u32) -> Option<Duration> {
        if f64::from(needed) > self.capacity {
            return None;
        }
        Some(self.refill_time(self.available(), needed))
    }

    /// Check and report what is left and when to retry
    pub fn check_detailed(&self, needed: u32) -> CheckOutcome {
        match self.take(needed) {
            Some((true, left)) => CheckOutcome::allowed(left.floor() as u32),
            Some((false, left)) => {
                trace!(needed, available = left, "Quota window denied request");
                CheckOutcome::denied(left.floor() as u32, Some(self.refill_time(left, needed)))
            }
            None => {
                trace!(needed, capacity = self.capacity, "Request exceeds quota capacity");
                CheckOutcome::denied(self.available().floor() as u32, None)
            }
        }
    }

    /// Snapshot of the current usage
    pub fn usage_stats(&self) -> UsageStats {
        let available = self.available();
        UsageStats {
            unlimited: false,
            capacity: self.capacity(),
            window_secs: self.window_secs(),
            available: Some(available),
            utilization_percent: (self.capacity - available) / self.capacity * 100.0,
            captured_at: chrono::Utc::now(),
        }
    }
}

impl Limit for BoundedWindow {
    fn check(&self, needed: u32) -> bool {
        match self.take(needed) {
            Some((allowed, left)) => {
                if !allowed {
                    trace!(needed, available = left, "Quota window denied request");
                }
                allowed
            }
            None => false,
        }
    }

    fn reset(&self) {
        let mut state = self.lock();
        state.available = self.capacity;
        state.last_checked = self.clock.now();
        debug!(capacity = self.capacity, "Quota window reset");
    }
}

/// A single sliding window limit
///
/// # Example
///
/// ```
/// use quota_window::{Limit, SlidingWindow};
///
/// let window = SlidingWindow::from_secs(10, 10).unwrap();
/// assert!(window.check(10));
/// assert!(!window.check(10));
/// ```
#[derive(Debug)]
pub enum SlidingWindow {
    /// No limit configured; every check passes
    Unlimited,
    /// A real limit
    Bounded(BoundedWindow),
}

impl SlidingWindow {
    /// Create a tracker using the system clock
    ///
    /// A capacity of `0` yields [`SlidingWindow::Unlimited`] and the window
    /// is ignored. A positive capacity needs a non-zero window.
    pub fn new(capacity: u32, window: Duration) -> Result<Self> {
        Self::with_clock(capacity, window, Arc::new(SystemClock))
    }

    /// Same as [`SlidingWindow::new`] with the window in whole seconds
    pub fn from_secs(capacity: u32, window_secs: u64) -> Result<Self> {
        Self::new(capacity, Duration::from_secs(window_secs))
    }

    /// Create a tracker that measures refill with `clock`
    pub fn with_clock(capacity: u32, window: Duration, clock: Arc<dyn Clock>) -> Result<Self> {
        if capacity == 0 {
            debug!("Created unlimited quota window");
            return Ok(Self::Unlimited);
        }

        let bounded = BoundedWindow::new(capacity, window, clock)?;
        debug!(capacity, window_secs = window.as_secs_f64(), "Created quota window");
        Ok(Self::Bounded(bounded))
    }

    /// Unlimited tracker
    pub fn unlimited() -> Self {
        Self::Unlimited
    }

    /// Whether every check passes
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// Maximum units per window, `0` if unlimited
    pub fn capacity(&self) -> u32 {
        match self {
            Self::Unlimited => 0,
            Self::Bounded(window) => window.capacity(),
        }
    }

    /// Window length, `None` if unlimited
    pub fn window(&self) -> Option<Duration> {
        match self {
            Self::Unlimited => None,
            Self::Bounded(window) => Some(window.window()),
        }
    }

    /// Allowance at the current instant, `None` if unlimited
    pub fn available(&self) -> Option<f64> {
        match self {
            Self::Unlimited => None,
            Self::Bounded(window) => Some(window.available()),
        }
    }

    /// Time until `needed` units would be granted
    ///
    /// Returns `None` if the request can never be granted.
    pub fn time_until_available(&self, needed: u32) -> Option<Duration> {
        match self {
            Self::Unlimited => Some(Duration::ZERO),
            Self::Bounded(window) => window.time_until_available(needed),
        }
    }

    /// Check and report what is left and when to retry
    pub fn check_detailed(&self, needed: u32) -> CheckOutcome {
        match self {
            Self::Unlimited => CheckOutcome::allowed(u32::MAX),
            Self::Bounded(window) => window.check_detailed(needed),
        }
    }

    /// Snapshot of the current usage
    pub fn usage_stats(&self) -> UsageStats {
        match self {
            Self::Unlimited => UsageStats {
                unlimited: true,
                capacity: 0,
                window_secs: 0.0,
                available: None,
                utilization_percent: 0.0,
                captured_at: chrono::Utc::now(),
            },
            Self::Bounded(window) => window.usage_stats(),
        }
    }
}

impl Limit for SlidingWindow {
    fn check(&self, needed: u32) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Bounded(window) => window.check(needed),
        }
    }

    fn reset(&self) {
        if let Self::Bounded(window) = self {
            window.reset();
        }
    }
}
