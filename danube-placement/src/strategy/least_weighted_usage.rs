use super::{pick_random, PlacementStrategy};
use crate::config::{LoadManagerConfig, PlacementStrategyKind};
use crate::load_data::{BrokerId, BundleId, LoadData};
use crate::rankings::{closeness_band, smoothed_score, weighted_usage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Places bundles on the broker with the lowest smoothed weighted resource usage.
///
/// ## Algorithm
/// On every call, for each candidate broker:
/// 1. Score the live CPU, memory, direct memory and bandwidth usage with the
///    configured resource weights
/// 2. Blend the score into the broker history with an exponential moving average
///    (`history_resource_percentage` of the old value is kept)
///
/// Every candidate's history advances, selected or not. The winner is then drawn
/// at random among the brokers whose smoothed score is within
/// `average_usage_difference_threshold_percentage` of the lowest one, so that
/// near-equal brokers share new bundles instead of one absorbing them all.
///
/// History only disappears through [`PlacementStrategy::on_active_brokers_change`];
/// a broker that rejoins later starts again from zero.
#[derive(Debug)]
pub struct LeastWeightedUsage<R = StdRng> {
    /// Smoothed weighted resource usage per broker
    broker_avg_usage: HashMap<BrokerId, f64>,
    rng: R,
}

impl LeastWeightedUsage<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl Default for LeastWeightedUsage<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> LeastWeightedUsage<R> {
    pub fn with_rng(rng: R) -> Self {
        LeastWeightedUsage {
            broker_avg_usage: HashMap::new(),
            rng,
        }
    }

    /// Scores every candidate present in the snapshot and stores the new averages.
    fn update_scores(
        &mut self,
        candidates: &BTreeSet<BrokerId>,
        load_data: &LoadData,
        config: &LoadManagerConfig,
    ) -> Vec<(BrokerId, f64)> {
        let mut scores = Vec::with_capacity(candidates.len());

        for broker_id in candidates {
            let Some(data) = load_data.broker(broker_id) else {
                warn!(broker_id = %broker_id, "no load data for candidate broker, skipping");
                continue;
            };

            let usage = weighted_usage(
                &data.local_data,
                &config.resource_weights,
                config.score_aggregation,
            );
            let previous = self.broker_avg_usage.get(broker_id).copied();
            let avg = smoothed_score(previous, usage, config.history_resource_percentage);
            debug!(broker_id = %broker_id, usage, avg, "updated broker weighted usage");

            self.broker_avg_usage.insert(broker_id.clone(), avg);
            scores.push((broker_id.clone(), avg));
        }

        scores
    }

    #[cfg(test)]
    pub(crate) fn avg_usage(&self, broker_id: &BrokerId) -> Option<f64> {
        self.broker_avg_usage.get(broker_id).copied()
    }

    #[cfg(test)]
    pub(crate) fn tracked_brokers(&self) -> usize {
        self.broker_avg_usage.len()
    }
}

impl<R: Rng> PlacementStrategy for LeastWeightedUsage<R> {
    fn select_broker(
        &mut self,
        candidates: &BTreeSet<BrokerId>,
        bundle: &BundleId,
        load_data: &LoadData,
        config: &LoadManagerConfig,
    ) -> Option<BrokerId> {
        let scores = self.update_scores(candidates, load_data, config);

        let min_score = scores
            .iter()
            .map(|(_, score)| *score)
            .reduce(f64::min)?;
        let band = closeness_band(min_score, config.usage_difference_threshold());

        let best_brokers: Vec<&BrokerId> = scores
            .iter()
            .filter(|(_, score)| *score <= band)
            .map(|(broker_id, _)| broker_id)
            .collect();

        let selected = pick_random(&mut self.rng, best_brokers)?.clone();
        debug!(
            bundle = %bundle,
            broker = %selected,
            min_score,
            "selected broker with least weighted resource usage"
        );
        Some(selected)
    }

    fn on_active_brokers_change(&mut self, active_brokers: &BTreeSet<BrokerId>) {
        let before = self.broker_avg_usage.len();
        self.broker_avg_usage
            .retain(|broker_id, _| active_brokers.contains(broker_id));

        let removed = before - self.broker_avg_usage.len();
        if removed > 0 {
            info!(removed, "dropped usage history of brokers no longer active");
        }
    }

    fn kind(&self) -> PlacementStrategyKind {
        PlacementStrategyKind::LeastWeightedUsage
    }
}

#[cfg(test)]
#[path = "least_weighted_usage_test.rs"]
mod tests;
