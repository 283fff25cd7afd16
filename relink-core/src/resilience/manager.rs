//! Registry of named reconnect strategies
//!
//! The manager is created by the application's composition root and passed
//! by reference to whoever needs it; there is no process-wide instance.
//! Registry mutations take one registry-level lock. Strategies share no
//! state with each other, so driving two connections from two threads only
//! contends on that lock for lookups.

use super::reconnect::{ReconnectStrategy, StrategyStatus};
use crate::config::ReconnectConfig;
use crate::core::clock::{system_clock, SharedClock};
use crate::core::errors::RegistryError;
use crate::core::types::LifecycleState;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Totals across every registered strategy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalMetrics {
    pub total_strategies: usize,
    /// Strategies currently `Connected`
    pub active_connections: usize,
    /// Strategies currently `CircuitOpen`
    pub circuit_open_connections: usize,
    pub total_connections: u64,
    pub successful_connections: u64,
    pub failed_connections: u64,
    /// `successful / max(1, total)`
    pub success_rate: f64,
    pub reconnect_attempts: u64,
    pub sequence_gaps: u64,
    pub heartbeat_misses: u64,
}

/// Named collection of independent [`ReconnectStrategy`] instances
#[derive(Debug)]
pub struct ReconnectManager {
    strategies: RwLock<HashMap<String, Arc<ReconnectStrategy>>>,
    clock: SharedClock,
}

impl ReconnectManager {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    /// Manager whose strategies all read time from `clock`
    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            strategies: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Create and register a strategy, replacing any existing one with the same name
    pub fn add_strategy(
        &self,
        name: impl Into<String>,
        config: ReconnectConfig,
    ) -> Arc<ReconnectStrategy> {
        let name = name.into();
        let strategy = self.build(&name, config);

        let previous = self
            .strategies
            .write()
            .insert(name.clone(), Arc::clone(&strategy));

        if previous.is_some() {
            warn!(connection = %name, "Replacing existing reconnect strategy");
        } else {
            info!(connection = %name, "Registered reconnect strategy");
        }
        strategy
    }

    /// Like [`add_strategy`](Self::add_strategy) but refuses to replace
    pub fn try_add_strategy(
        &self,
        name: impl Into<String>,
        config: ReconnectConfig,
    ) -> Result<Arc<ReconnectStrategy>, RegistryError> {
        let name = name.into();
        let mut strategies = self.strategies.write();
        if strategies.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }

        let strategy = self.build(&name, config);
        strategies.insert(name.clone(), Arc::clone(&strategy));
        info!(connection = %name, "Registered reconnect strategy");
        Ok(strategy)
    }

    fn build(&self, name: &str, config: ReconnectConfig) -> Arc<ReconnectStrategy> {
        Arc::new(ReconnectStrategy::with_clock(
            name,
            config,
            Arc::clone(&self.clock),
        ))
    }

    pub fn get_strategy(&self, name: &str) -> Option<Arc<ReconnectStrategy>> {
        self.strategies.read().get(name).cloned()
    }

    /// Returns true if a strategy was removed
    pub fn remove_strategy(&self, name: &str) -> bool {
        let removed = self.strategies.write().remove(name).is_some();
        if removed {
            info!(connection = %name, "Removed reconnect strategy");
        } else {
            debug!(connection = %name, "No reconnect strategy to remove");
        }
        removed
    }

    /// Snapshot of the registry; later registrations don't show up in it
    pub fn get_all_strategies(&self) -> HashMap<String, Arc<ReconnectStrategy>> {
        self.strategies.read().clone()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.strategies.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.strategies.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.read().is_empty()
    }

    /// Aggregate metrics over every registered strategy
    ///
    /// The registry lock is only held while copying handles; each strategy
    /// is then read under its own lock.
    pub fn get_global_metrics(&self) -> GlobalMetrics {
        let strategies: Vec<Arc<ReconnectStrategy>> =
            self.strategies.read().values().cloned().collect();

        let mut global = GlobalMetrics {
            total_strategies: strategies.len(),
            ..Default::default()
        };

        for strategy in &strategies {
            let status = strategy.status();
            match status.state {
                LifecycleState::Connected => global.active_connections += 1,
                LifecycleState::CircuitOpen => global.circuit_open_connections += 1,
                _ => {}
            }
            let m = &status.metrics;
            global.total_connections += m.total_connections;
            global.successful_connections += m.successful_connections;
            global.failed_connections += m.failed_connections;
            global.reconnect_attempts += m.reconnect_attempts;
            global.sequence_gaps += m.sequence_gaps;
            global.heartbeat_misses += m.heartbeat_misses;
        }

        global.success_rate =
            global.successful_connections as f64 / global.total_connections.max(1) as f64;
        global
    }

    /// Per-connection status, keyed and ordered by name
    pub fn status_report(&self) -> BTreeMap<String, StrategyStatus> {
        let strategies = self.get_all_strategies();
        strategies
            .into_iter()
            .map(|(name, strategy)| (name, strategy.status()))
            .collect()
    }
}

impl Default for ReconnectManager {
    fn default() -> Self {
        Self::new()
    }
}
