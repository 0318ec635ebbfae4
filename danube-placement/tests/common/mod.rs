//! Shared helpers for `danube-placement` integration tests.

#![allow(dead_code)]

use danube_placement::{BrokerData, BrokerId, LoadData, LocalBrokerData, ResourceUsage};
use std::collections::BTreeSet;

/// Installs a fmt subscriber once so `tracing` output shows up with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn brokers(ids: &[&str]) -> BTreeSet<BrokerId> {
    ids.iter().map(|id| BrokerId::from(*id)).collect()
}

/// Snapshot where every resource of a broker is at `usage` out of 100 and the
/// broker reports `rate_in` msg/s of long-term inbound traffic.
pub fn snapshot(entries: &[(&str, f64, f64)]) -> LoadData {
    let mut load_data = LoadData::new();
    for (id, usage, rate_in) in entries {
        let data = BrokerData::new(LocalBrokerData::uniform(*usage, 100.0))
            .with_long_term_msg_rate_in(*rate_in);
        load_data.insert(*id, data);
    }
    load_data
}

pub fn set_cpu(load_data: &mut LoadData, id: &str, usage: f64) {
    if let Some(data) = load_data.broker_mut(&BrokerId::from(id)) {
        data.local_data.cpu = ResourceUsage::new(usage, 100.0);
    }
}
