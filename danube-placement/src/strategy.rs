//! Broker selection strategies.
//!
//! A strategy receives the brokers that may own a bundle, together with the
//! latest load snapshot and configuration, and picks one of them. Strategies
//! may remember their previous decisions; that memory is private to the
//! instance and is only changed by [`PlacementStrategy::select_broker`],
//! [`PlacementStrategy::forget_bundle`] and
//! [`PlacementStrategy::on_active_brokers_change`].

mod least_message_rate;
mod least_weighted_usage;
mod sticky_shedder;

pub use least_message_rate::LeastMessageRate;
pub use least_weighted_usage::LeastWeightedUsage;
pub use sticky_shedder::StickyShedder;

use crate::config::{LoadManagerConfig, PlacementStrategyKind};
use crate::load_data::{BrokerId, BundleId, LoadData};
use rand::Rng;
use std::collections::BTreeSet;

pub type BoxedStrategy = Box<dyn PlacementStrategy + Send>;

pub trait PlacementStrategy {
    /// Picks the broker that should own `bundle`.
    ///
    /// Returns `None` when no candidate is eligible, the caller should defer
    /// the placement. An empty candidate set is not an error.
    fn select_broker(
        &mut self,
        candidates: &BTreeSet<BrokerId>,
        bundle: &BundleId,
        load_data: &LoadData,
        config: &LoadManagerConfig,
    ) -> Option<BrokerId>;

    /// Called when the set of live brokers changes. Strategies keeping per-broker
    /// state drop every broker that is not in `active_brokers`.
    fn on_active_brokers_change(&mut self, _active_brokers: &BTreeSet<BrokerId>) {}

    /// Drops whatever the strategy remembers about a bundle that was unloaded,
    /// split or deleted. Returns the broker it was remembered on, if any.
    fn forget_bundle(&mut self, _bundle: &BundleId) -> Option<BrokerId> {
        None
    }

    fn kind(&self) -> PlacementStrategyKind;
}

/// Creates a strategy with empty state and an OS seeded random source.
pub fn build_strategy(kind: PlacementStrategyKind) -> BoxedStrategy {
    match kind {
        PlacementStrategyKind::StickyShedder => Box::new(StickyShedder::new()),
        PlacementStrategyKind::LeastMessageRate => Box::new(LeastMessageRate::new()),
        PlacementStrategyKind::LeastWeightedUsage => Box::new(LeastWeightedUsage::new()),
    }
}

/// Uniform pick among `brokers`, `None` if there is nothing to pick from.
pub(crate) fn pick_random<'a, I, R>(rng: &mut R, brokers: I) -> Option<&'a BrokerId>
where
    I: IntoIterator<Item = &'a BrokerId>,
    I::IntoIter: ExactSizeIterator,
    R: Rng,
{
    let mut brokers = brokers.into_iter();
    let len = brokers.len();
    if len == 0 {
        return None;
    }
    brokers.nth(rng.random_range(0..len))
}
