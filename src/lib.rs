//! quota-window
//!
//! In-process sliding-window quota limiting: continuously refilling
//! allowance counters and a registry that shares them by name.
//!
//! ```
//! use quota_window::{Limit, LimitRegistry, SlidingWindow};
//! use std::time::Duration;
//!
//! // Unnamed: the caller owns the tracker
//! let window = SlidingWindow::new(100, Duration::from_secs(60)).unwrap();
//! assert!(window.check(1));
//!
//! // Named: shared through a registry
//! let registry = LimitRegistry::new();
//! registry.create_named("api", 10, Duration::from_secs(1)).unwrap();
//! assert!(registry.check("api", 10).unwrap());
//! assert!(!registry.check("api", 1).unwrap());
//! ```

pub mod rate_limit;

pub use rate_limit::{
    check, create_named, global, reset, BoundedWindow, CheckOutcome, Clock, Limit, LimitConfig,
    LimitRegistry, ManualClock, QuotaError, RegistryConfig, Result, SlidingWindow, SystemClock,
    UsageStats,
};
