//! Named Limit Registry
//!
//! Maps names to sliding window trackers so any number of call sites can
//! share one limit without passing handles around.
//!
//! The map is guarded by a reader/writer lock: lookups for check and reset
//! run in parallel, creation is serialized. The lock is held only for the
//! map operation; the tracker does its own locking for the refill math.

use lazy_static::lazy_static;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::config::RegistryConfig;
use super::error::{QuotaError, Result};
use super::quota::{CheckOutcome, Limit, SlidingWindow, UsageStats};

lazy_static! {
    static ref GLOBAL_REGISTRY: LimitRegistry = LimitRegistry::new();
}

/// Process-wide registry, created empty on first use
pub fn global() -> &'static LimitRegistry {
    &GLOBAL_REGISTRY
}

/// Create a named limit in the process-wide registry
pub fn create_named(name: &str, capacity: u32, window_secs: u64) -> Result<()> {
    global().create_named(name, capacity, Duration::from_secs(window_secs))
}

/// Check a named limit in the process-wide registry
pub fn check(name: &str, needed: u32) -> Result<bool> {
    global().check(name, needed)
}

/// Reset a named limit in the process-wide registry
pub fn reset(name: &str) -> Result<()> {
    global().reset(name)
}

/// Concurrency-safe map from names to trackers
///
/// Clones share the same map.
#[derive(Debug, Clone)]
pub struct LimitRegistry {
    /// Tracker storage
    limits: Arc<RwLock<HashMap<String, Arc<SlidingWindow>>>>,

    /// Clock handed to every tracker created here
    clock: Arc<dyn Clock>,
}

impl LimitRegistry {
    /// Create an empty registry using the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty registry whose trackers measure refill with `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            limits: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Create a registry pre-populated from configuration
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let registry = Self::new();
        registry.install(config)?;
        Ok(registry)
    }

    /// Create every limit named in `config`
    ///
    /// Stops at the first limit that cannot be created; limits created
    /// before it stay registered.
    pub fn install(&self, config: &RegistryConfig) -> Result<()> {
        for (name, limit) in &config.limits {
            self.create_named(name, limit.capacity, limit.window())?;
        }
        info!(count = config.limits.len(), "Installed named limits from configuration");
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<SlidingWindow>>> {
        self.limits.read().unwrap_or_else(|poisoned| {
            warn!("Recovering poisoned limit registry lock");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<SlidingWindow>>> {
        self.limits.write().unwrap_or_else(|poisoned| {
            warn!("Recovering poisoned limit registry lock");
            poisoned.into_inner()
        })
    }

    fn lookup(&self, name: &str) -> Result<Arc<SlidingWindow>> {
        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| QuotaError::NotFound(name.to_string()))
    }

    /// Create a named limit
    ///
    /// Fails with `InvalidName` for an empty name and `AlreadyExists` if
    /// the name is taken; the existing limit is left untouched.
    pub fn create_named(&self, name: &str, capacity: u32, window: Duration) -> Result<()> {
        if name.is_empty() {
            return Err(QuotaError::InvalidName(name.to_string()));
        }

        let mut limits = self.write();
        match limits.entry(name.to_string()) {
            Entry::Occupied(_) => Err(QuotaError::AlreadyExists(name.to_string())),
            Entry::Vacant(slot) => {
                let window = SlidingWindow::with_clock(capacity, window, Arc::clone(&self.clock))?;
                slot.insert(Arc::new(window));
                debug!(name, capacity, "Registered named limit");
                Ok(())
            }
        }
    }

    /// Try to consume `needed` units from a named limit
    pub fn check(&self, name: &str, needed: u32) -> Result<bool> {
        Ok(self.lookup(name)?.check(needed))
    }

    /// Detailed check against a named limit
    pub fn check_detailed(&self, name: &str, needed: u32) -> Result<CheckOutcome> {
        Ok(self.lookup(name)?.check_detailed(needed))
    }

    /// Refill a named limit to full capacity
    pub fn reset(&self, name: &str) -> Result<()> {
        self.lookup(name)?.reset();
        debug!(name, "Reset named limit");
        Ok(())
    }

    /// Shared handle to a named limit
    pub fn get(&self, name: &str) -> Option<Arc<SlidingWindow>> {
        self.read().get(name).cloned()
    }

    /// Whether a limit is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Number of named limits
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no limits are registered
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Usage statistics for every named limit, keyed by name
    pub fn stats(&self) -> BTreeMap<String, UsageStats> {
        let limits: Vec<(String, Arc<SlidingWindow>)> = self
            .read()
            .iter()
            .map(|(name, window)| (name.clone(), Arc::clone(window)))
            .collect();

        limits
            .into_iter()
            .map(|(name, window)| (name, window.usage_stats()))
            .collect()
    }
}

impl Default for LimitRegistry {
    fn default() -> Self {
        Self::new()
    }
}
