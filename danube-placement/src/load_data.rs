use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Identifier of a broker that can own bundles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrokerId(String);

impl BrokerId {
    pub fn new(id: impl Into<String>) -> Self {
        BrokerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BrokerId {
    fn from(id: &str) -> Self {
        BrokerId(id.to_string())
    }
}

impl From<String> for BrokerId {
    fn from(id: String) -> Self {
        BrokerId(id)
    }
}

impl Display for BrokerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a bundle, a contiguous hash range of a namespace's topics
/// (e.g. `tenant/ns/0x00000000_0x40000000`).
///
/// Placement treats it as an opaque key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleId(String);

impl BundleId {
    pub fn new(id: impl Into<String>) -> Self {
        BundleId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BundleId {
    fn from(id: &str) -> Self {
        BundleId(id.to_string())
    }
}

impl Display for BundleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single resource reading: how much is used out of the available limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub usage: f64,
    pub limit: f64,
}

impl ResourceUsage {
    pub fn new(usage: f64, limit: f64) -> Self {
        ResourceUsage { usage, limit }
    }

    /// Used / limit, or 0.0 when the reading can't produce a finite fraction
    /// (unset or zero limit).
    ///
    /// Negative readings are passed through unchanged, scoring code must not
    /// assume the result is within [0, 1].
    pub fn fraction(&self) -> f64 {
        if self.limit <= 0.0 {
            return 0.0;
        }
        let fraction = self.usage / self.limit;
        if fraction.is_finite() {
            fraction
        } else {
            0.0
        }
    }
}

/// Live resource usage reported by a broker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalBrokerData {
    pub cpu: ResourceUsage,
    pub memory: ResourceUsage,
    pub direct_memory: ResourceUsage,
    pub bandwidth_in: ResourceUsage,
    pub bandwidth_out: ResourceUsage,
}

impl LocalBrokerData {
    /// Every resource dimension set to the same reading.
    pub fn uniform(usage: f64, limit: f64) -> Self {
        let reading = ResourceUsage::new(usage, limit);
        LocalBrokerData {
            cpu: reading,
            memory: reading,
            direct_memory: reading,
            bandwidth_in: reading,
            bandwidth_out: reading,
        }
    }
}

/// Message rates smoothed over time by the load aggregation pipeline (msg/s).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeAverageBrokerData {
    pub short_term_msg_rate_in: f64,
    pub short_term_msg_rate_out: f64,
    pub long_term_msg_rate_in: f64,
    pub long_term_msg_rate_out: f64,
}

/// Everything placement knows about one broker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerData {
    pub local_data: LocalBrokerData,
    pub time_average_data: TimeAverageBrokerData,
}

impl BrokerData {
    pub fn new(local_data: LocalBrokerData) -> Self {
        BrokerData {
            local_data,
            time_average_data: TimeAverageBrokerData::default(),
        }
    }

    pub fn with_long_term_msg_rate_in(mut self, rate: f64) -> Self {
        self.time_average_data.long_term_msg_rate_in = rate;
        self
    }
}

/// Snapshot of the cluster load, rebuilt by the load manager before each decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadData {
    pub brokers: HashMap<BrokerId, BrokerData>,
}

impl LoadData {
    pub fn new() -> Self {
        LoadData::default()
    }

    pub fn insert(&mut self, broker_id: impl Into<BrokerId>, data: BrokerData) {
        self.brokers.insert(broker_id.into(), data);
    }

    /// Stores a broker report published as JSON on the metadata store.
    pub fn insert_from_json(&mut self, broker_id: impl Into<BrokerId>, value: &[u8]) -> Result<()> {
        let data: BrokerData = serde_json::from_slice(value)?;
        self.brokers.insert(broker_id.into(), data);
        Ok(())
    }

    pub fn broker(&self, broker_id: &BrokerId) -> Option<&BrokerData> {
        self.brokers.get(broker_id)
    }

    pub fn broker_mut(&mut self, broker_id: &BrokerId) -> Option<&mut BrokerData> {
        self.brokers.get_mut(broker_id)
    }
}
