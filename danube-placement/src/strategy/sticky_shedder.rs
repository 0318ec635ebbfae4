use super::{pick_random, PlacementStrategy};
use crate::config::{LoadManagerConfig, PlacementStrategyKind};
use crate::load_data::{BrokerId, BundleId, LoadData};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Keeps each bundle on the broker it was last placed on.
///
/// Load is not considered here: which bundles to shed is decided by the load
/// manager before asking for a new owner. A bundle only moves when its previous
/// owner is no longer among the candidates, in which case a candidate is drawn
/// at random and remembered.
#[derive(Debug)]
pub struct StickyShedder<R = StdRng> {
    /// Last broker each bundle was placed on
    bundle_broker: HashMap<BundleId, BrokerId>,
    rng: R,
}

impl StickyShedder<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl Default for StickyShedder<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> StickyShedder<R> {
    pub fn with_rng(rng: R) -> Self {
        StickyShedder {
            bundle_broker: HashMap::new(),
            rng,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_assignment(mut self, bundle: BundleId, broker: BrokerId) -> Self {
        self.bundle_broker.insert(bundle, broker);
        self
    }

    #[cfg(test)]
    pub(crate) fn assignment(&self, bundle: &BundleId) -> Option<&BrokerId> {
        self.bundle_broker.get(bundle)
    }
}

impl<R: Rng> PlacementStrategy for StickyShedder<R> {
    fn select_broker(
        &mut self,
        candidates: &BTreeSet<BrokerId>,
        bundle: &BundleId,
        _load_data: &LoadData,
        _config: &LoadManagerConfig,
    ) -> Option<BrokerId> {
        if let Some(broker) = self.bundle_broker.get(bundle) {
            if candidates.contains(broker) {
                return Some(broker.clone());
            }
            debug!(
                bundle = %bundle,
                broker = %broker,
                "previous owner is no longer a candidate, shedding the bundle"
            );
        }

        let selected = pick_random(&mut self.rng, candidates)?.clone();
        debug!(bundle = %bundle, broker = %selected, "bundle assigned to a random candidate");
        self.bundle_broker.insert(bundle.clone(), selected.clone());
        Some(selected)
    }

    fn forget_bundle(&mut self, bundle: &BundleId) -> Option<BrokerId> {
        let previous = self.bundle_broker.remove(bundle);
        if let Some(broker) = &previous {
            debug!(bundle = %bundle, broker = %broker, "forgot bundle assignment");
        }
        previous
    }

    fn kind(&self) -> PlacementStrategyKind {
        PlacementStrategyKind::StickyShedder
    }
}

#[cfg(test)]
#[path = "sticky_shedder_test.rs"]
mod tests;
