use crate::errors::{PlacementError, Result};
use serde::{Deserialize, Serialize};

/// Placement strategy used to choose the owner broker of a bundle
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategyKind {
    /// Keep a bundle on the broker it was last placed on, random fallback
    /// Best for: minimizing ownership churn, shedding decided elsewhere
    StickyShedder,

    /// Lowest long-term inbound message rate, overloaded brokers excluded (default)
    /// Best for: throughput-dominated clusters
    LeastMessageRate,

    /// Lowest smoothed weighted resource usage, random among near-equal brokers
    /// Best for: mixed workloads where CPU, memory and bandwidth all matter
    LeastWeightedUsage,
}

impl Default for PlacementStrategyKind {
    fn default() -> Self {
        Self::LeastMessageRate
    }
}

/// How the weighted per-resource usage fractions of a broker are folded into one score
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreAggregation {
    /// The most loaded weighted resource is the broker score (default)
    Max,
    /// The weighted resources are added up
    Sum,
}

impl Default for ScoreAggregation {
    fn default() -> Self {
        Self::Max
    }
}

/// Multipliers applied to each resource usage fraction. A zero weight ignores the resource.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ResourceWeights {
    pub cpu: f64,
    pub memory: f64,
    pub direct_memory: f64,
    pub bandwidth_in: f64,
    pub bandwidth_out: f64,
}

impl Default for ResourceWeights {
    fn default() -> Self {
        Self {
            cpu: 1.0,
            memory: 1.0,
            direct_memory: 1.0,
            bandwidth_in: 1.0,
            bandwidth_out: 1.0,
        }
    }
}

impl ResourceWeights {
    fn validate(&self) -> Result<()> {
        let weights = [
            ("cpu", self.cpu),
            ("memory", self.memory),
            ("direct_memory", self.direct_memory),
            ("bandwidth_in", self.bandwidth_in),
            ("bandwidth_out", self.bandwidth_out),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(PlacementError::InvalidConfig(format!(
                    "resource weight `{}` must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }
}

/// Load Manager placement configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoadManagerConfig {
    /// Strategy used for new bundle placement
    pub strategy: PlacementStrategyKind,
    /// Per-resource weights used by the weighted usage strategy
    pub resource_weights: ResourceWeights,
    /// Share of the previous smoothed score kept on each update, in [0, 1]
    pub history_resource_percentage: f64,
    /// Brokers within this percentage above the lowest smoothed score are considered equal
    pub average_usage_difference_threshold_percentage: f64,
    /// CPU usage percentage above which a broker is not offered new bundles by rate
    pub broker_overloaded_threshold_percentage: f64,
    /// Folding of the weighted resource fractions into a broker score
    pub score_aggregation: ScoreAggregation,
}

impl Default for LoadManagerConfig {
    fn default() -> Self {
        Self {
            strategy: PlacementStrategyKind::default(),
            resource_weights: ResourceWeights::default(),
            history_resource_percentage: 0.9,
            average_usage_difference_threshold_percentage: 10.0,
            broker_overloaded_threshold_percentage: 85.0,
            score_aggregation: ScoreAggregation::default(),
        }
    }
}

impl LoadManagerConfig {
    /// Parses the `load_manager` section of the broker configuration file
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: LoadManagerConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.resource_weights.validate()?;

        let history = self.history_resource_percentage;
        if !(0.0..=1.0).contains(&history) {
            return Err(PlacementError::InvalidConfig(format!(
                "history_resource_percentage must be within [0, 1], got {}",
                history
            )));
        }

        let percentages = [
            (
                "average_usage_difference_threshold_percentage",
                self.average_usage_difference_threshold_percentage,
            ),
            (
                "broker_overloaded_threshold_percentage",
                self.broker_overloaded_threshold_percentage,
            ),
        ];
        for (name, value) in percentages {
            if !value.is_finite() || value < 0.0 {
                return Err(PlacementError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }

    /// Overload threshold as a usage fraction (85% -> 0.85)
    pub fn overload_threshold(&self) -> f64 {
        self.broker_overloaded_threshold_percentage / 100.0
    }

    /// Closeness band as a fraction of the minimum score (10% -> 0.1)
    pub fn usage_difference_threshold(&self) -> f64 {
        self.average_usage_difference_threshold_percentage / 100.0
    }
}
