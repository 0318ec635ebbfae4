use super::PlacementStrategy;
use crate::config::{LoadManagerConfig, PlacementStrategyKind};
use crate::load_data::{BrokerData, BrokerId, BundleId, LoadData};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Places bundles on the broker with the lowest long-term inbound message rate.
///
/// Brokers whose CPU usage is above the overload threshold are never selected.
/// Ties keep the first broker in id order, so the same inputs always give the
/// same answer. Keeps no state between calls.
#[derive(Debug, Default)]
pub struct LeastMessageRate;

impl LeastMessageRate {
    pub fn new() -> Self {
        LeastMessageRate
    }
}

/// Message rate used for ranking, `None` if the broker is overloaded.
fn rate_score(broker_id: &BrokerId, data: &BrokerData, overload_threshold: f64) -> Option<f64> {
    let cpu_usage = data.local_data.cpu.fraction();
    if cpu_usage > overload_threshold {
        warn!(
            broker_id = %broker_id,
            cpu_usage,
            overload_threshold,
            "broker is overloaded, excluded from placement"
        );
        return None;
    }
    let rate = data.time_average_data.long_term_msg_rate_in;
    if rate.is_nan() {
        warn!(broker_id = %broker_id, "broker reported an invalid message rate, skipping");
        return None;
    }
    Some(rate)
}

impl PlacementStrategy for LeastMessageRate {
    fn select_broker(
        &mut self,
        candidates: &BTreeSet<BrokerId>,
        bundle: &BundleId,
        load_data: &LoadData,
        config: &LoadManagerConfig,
    ) -> Option<BrokerId> {
        let overload_threshold = config.overload_threshold();
        let mut best: Option<(&BrokerId, f64)> = None;

        for broker_id in candidates {
            let Some(data) = load_data.broker(broker_id) else {
                warn!(broker_id = %broker_id, "no load data for candidate broker, skipping");
                continue;
            };
            let Some(rate) = rate_score(broker_id, data, overload_threshold) else {
                continue;
            };

            match best {
                Some((_, best_rate)) if rate >= best_rate => {}
                _ => best = Some((broker_id, rate)),
            }
        }

        match best {
            Some((broker_id, rate)) => {
                debug!(bundle = %bundle, broker = %broker_id, rate, "selected broker with least message rate");
                Some(broker_id.clone())
            }
            None => {
                debug!(bundle = %bundle, "no eligible broker for bundle");
                None
            }
        }
    }

    fn kind(&self) -> PlacementStrategyKind {
        PlacementStrategyKind::LeastMessageRate
    }
}

#[cfg(test)]
#[path = "least_message_rate_test.rs"]
mod tests;
