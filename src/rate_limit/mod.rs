//! Sliding Window Rate Limiting
//!
//! Admission control for in-process resources: a tracker answers, right
//! now and without waiting, whether a caller may consume N units of a
//! bounded allowance that refills continuously over a time window.
//!
//! # Features
//!
//! - Linear refill (leaky-bucket style) instead of discrete window resets
//! - Lock-free unlimited trackers for the "no limit configured" path
//! - Registry of named limits shared across call sites
//! - Pluggable clock for deterministic tests
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Limit Registry                          │
//! │        name ──▶ Arc<SlidingWindow>   (RwLock<HashMap>)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐      ┌──────────────────────────┐  │
//! │  │ Unlimited           │      │ Bounded                  │  │
//! │  │ no lock, always ok  │      │ Mutex<available, last>   │  │
//! │  └─────────────────────┘      └──────────────────────────┘  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                 Clock (System / Manual)                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod quota;
pub mod registry;

#[cfg(test)]
mod proptests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LimitConfig, RegistryConfig};
pub use error::{QuotaError, Result};
pub use quota::{BoundedWindow, CheckOutcome, Limit, SlidingWindow, UsageStats};
pub use registry::{check, create_named, global, reset, LimitRegistry};
