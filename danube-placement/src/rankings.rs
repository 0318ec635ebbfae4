use crate::config::{ResourceWeights, ScoreAggregation};
use crate::load_data::LocalBrokerData;

/// Weighted resource usage of a broker.
///
/// ## Algorithm
/// Each of the five resource usage fractions (CPU, memory, direct memory,
/// bandwidth in, bandwidth out) is multiplied by its weight, then the weighted
/// fractions are folded according to `aggregation`:
/// - `Max`: the bottleneck resource decides the score
/// - `Sum`: all resources contribute
///
/// No normalization by the sum of weights is applied, scores are only
/// comparable between brokers scored with the same weights.
pub(crate) fn weighted_usage(
    local_data: &LocalBrokerData,
    weights: &ResourceWeights,
    aggregation: ScoreAggregation,
) -> f64 {
    let weighted = [
        local_data.cpu.fraction() * weights.cpu,
        local_data.memory.fraction() * weights.memory,
        local_data.direct_memory.fraction() * weights.direct_memory,
        local_data.bandwidth_in.fraction() * weights.bandwidth_in,
        local_data.bandwidth_out.fraction() * weights.bandwidth_out,
    ];

    match aggregation {
        ScoreAggregation::Max => weighted.into_iter().fold(0.0, f64::max),
        ScoreAggregation::Sum => weighted.into_iter().sum(),
    }
}

/// Exponential moving average: `history * previous + (1 - history) * current`.
///
/// A broker seen for the first time starts from a previous score of 0.
pub(crate) fn smoothed_score(previous: Option<f64>, current: f64, history: f64) -> f64 {
    history * previous.unwrap_or(0.0) + (1.0 - history) * current
}

/// Upper bound of the closeness band around the lowest score.
///
/// The band is relative, so it widens as the cluster gets busier. It always
/// contains `min_score`, even when a malformed reading drives it below zero.
pub(crate) fn closeness_band(min_score: f64, threshold: f64) -> f64 {
    min_score + min_score.abs() * threshold
}
