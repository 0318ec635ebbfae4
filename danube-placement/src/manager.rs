use crate::config::{LoadManagerConfig, PlacementStrategyKind};
use crate::errors::Result;
use crate::load_data::{BrokerId, BundleId, LoadData};
use crate::strategy::{build_strategy, BoxedStrategy};

use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

type AssignmentCallback = Arc<dyn Fn(&BrokerId, &BundleId) + Send + Sync>;

/// PlacementManager - Shared entry point to the active placement strategy
///
/// The load manager loop asks it where a bundle should live, either while
/// rebalancing the cluster or when a new bundle shows up, and tells it when
/// brokers join or leave.
///
/// ## Responsibilities:
/// - **Placement**: Delegates each decision to the configured strategy with the current config
/// - **Eviction**: Forwards broker membership changes so strategies drop stale broker state
/// - **Reconfiguration**: Swaps the strategy only when the configured kind changes
///
/// ## Thread Safety:
/// The strategy and the config sit behind one `Arc<Mutex>`, so at most one decision
/// runs at a time and a strategy is never swapped in the middle of a decision.
#[derive(Clone)]
pub struct PlacementManager {
    state: Arc<Mutex<PlacementState>>,

    /// Callback for recording bundle assignment metrics
    assignment_callback: Option<AssignmentCallback>,
}

struct PlacementState {
    config: LoadManagerConfig,
    strategy: BoxedStrategy,
}

impl std::fmt::Debug for PlacementManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacementManager")
            .field("has_callback", &self.assignment_callback.is_some())
            .finish()
    }
}

impl PlacementManager {
    /// Creates a manager running the strategy named in `config`
    pub fn new(config: LoadManagerConfig) -> Result<Self> {
        let strategy = build_strategy(config.strategy);
        Self::with_strategy(config, strategy)
    }

    /// Creates a manager around an already built strategy
    ///
    /// The strategy kind wins over `config.strategy`, the stored config is aligned to it.
    pub fn with_strategy(mut config: LoadManagerConfig, strategy: BoxedStrategy) -> Result<Self> {
        config.validate()?;
        config.strategy = strategy.kind();
        info!(strategy = ?config.strategy, "placement manager initialized");

        Ok(PlacementManager {
            state: Arc::new(Mutex::new(PlacementState { config, strategy })),
            assignment_callback: None,
        })
    }

    /// Sets a callback for recording bundle assignment metrics
    pub fn with_assignment_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&BrokerId, &BundleId) + Send + Sync + 'static,
    {
        self.assignment_callback = Some(Arc::new(callback));
        self
    }

    /// Chooses the broker that should own `bundle` among `candidates`
    ///
    /// `None` means no candidate is eligible right now and the placement should be retried later.
    pub async fn select_broker(
        &self,
        candidates: &BTreeSet<BrokerId>,
        bundle: &BundleId,
        load_data: &LoadData,
    ) -> Option<BrokerId> {
        let mut state = self.state.lock().await;
        let PlacementState { config, strategy } = &mut *state;

        let selected = strategy.select_broker(candidates, bundle, load_data, config);
        drop(state);

        match &selected {
            Some(broker_id) => {
                info!(bundle = %bundle, broker_id = %broker_id, "bundle placed on broker");
                if let Some(callback) = &self.assignment_callback {
                    callback(broker_id, bundle);
                }
            }
            None => debug!(
                bundle = %bundle,
                candidates = candidates.len(),
                "no eligible broker, placement deferred"
            ),
        }

        selected
    }

    /// Forwards a change of the live broker set to the active strategy
    pub async fn on_active_brokers_change(&self, active_brokers: &BTreeSet<BrokerId>) {
        let mut state = self.state.lock().await;
        debug!(active_brokers = active_brokers.len(), "active brokers changed");
        state.strategy.on_active_brokers_change(active_brokers);
    }

    /// Tells the active strategy that a bundle was unloaded, split or deleted
    ///
    /// Returns the broker the strategy had remembered for it, if any.
    pub async fn forget_bundle(&self, bundle: &BundleId) -> Option<BrokerId> {
        let mut state = self.state.lock().await;
        state.strategy.forget_bundle(bundle)
    }

    /// Applies a new configuration
    ///
    /// A different strategy kind replaces the strategy with a fresh instance, dropping
    /// all state of the previous one. The same kind keeps the accumulated state.
    pub async fn update_config(&self, config: LoadManagerConfig) -> Result<()> {
        config.validate()?;

        let mut state = self.state.lock().await;
        let current = state.strategy.kind();
        if current != config.strategy {
            info!(
                from = ?current,
                to = ?config.strategy,
                "placement strategy changed, replacing it"
            );
            state.strategy = build_strategy(config.strategy);
        }
        state.config = config;

        Ok(())
    }

    pub async fn strategy_kind(&self) -> PlacementStrategyKind {
        self.state.lock().await.strategy.kind()
    }

    pub async fn config(&self) -> LoadManagerConfig {
        self.state.lock().await.config.clone()
    }
}
