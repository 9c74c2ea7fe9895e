//! A thread-safe registry for per-experiment kill switches.
//! [`KillSwitchStore`] is the one piece of shared mutable state in the core:
//! every assignment request reads it, and operators write it rarely.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::{Result, Str};

/// Backing store for per-experiment kill switches.
///
/// The store is injected into the engine, so the single-process in-memory
/// default can be swapped for a shared external store (required when the
/// engine runs on more than one process, since each process otherwise has an
/// independent view of kill status) without changing evaluation code.
///
/// External implementations should bound their calls with a timeout and
/// report outages as [`Error::RegistryUnavailable`](crate::Error); how the
/// engine reacts is governed by
/// [`RegistryFailurePolicy`](crate::RegistryFailurePolicy).
pub trait KillSwitchStore: Send + Sync {
    /// Return whether the experiment is currently killed. Experiments that
    /// were never written default to not killed.
    fn is_killed(&self, experiment_id: &str) -> Result<bool>;

    /// Set the killed flag for an experiment. Entries are created lazily on
    /// first write. The update must be atomic with respect to concurrent
    /// reads of the same experiment: a reader observes either the old or the
    /// new value, never a torn one.
    fn set_killed(&self, experiment_id: &str, killed: bool) -> Result<()>;
}

/// In-memory kill-switch store for single-process deployments.
///
/// Writes replace the whole entry under a write lock, so readers never
/// observe a torn value. This store has no failure modes; both operations
/// always return `Ok`.
#[derive(Default)]
pub struct InMemoryKillSwitchStore {
    state: RwLock<HashMap<Str, bool>>,
}

impl InMemoryKillSwitchStore {
    /// Create a new store with no experiments killed.
    pub fn new() -> Self {
        InMemoryKillSwitchStore::default()
    }
}

impl KillSwitchStore for InMemoryKillSwitchStore {
    fn is_killed(&self, experiment_id: &str) -> Result<bool> {
        // self.state.read() should always return Ok(). Err() is possible only
        // if the lock is poisoned (writer panicked while holding the lock),
        // which should never happen.
        let state = self
            .state
            .read()
            .expect("thread holding kill-switch lock should not panic");

        Ok(state.get(experiment_id).copied().unwrap_or(false))
    }

    fn set_killed(&self, experiment_id: &str, killed: bool) -> Result<()> {
        let mut state = self
            .state
            .write()
            .expect("thread holding kill-switch lock should not panic");

        state.insert(experiment_id.into(), killed);

        log::debug!(target: "abtest", experiment_id, killed; "kill switch updated");
        Ok(())
    }
}
