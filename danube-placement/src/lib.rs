//! # Danube Placement
//!
//! Broker selection for Danube bundles: given the live brokers and a bundle that
//! needs an owner, decide which broker takes it.
//!
//! ## Strategies
//!
//! - **Sticky Shedder**: keeps a bundle on its previous broker while it stays a candidate
//! - **Least Message Rate**: lowest long-term inbound message rate, overloaded brokers excluded
//! - **Least Weighted Usage**: lowest smoothed weighted resource usage, random among near-equal brokers
//!
//! ## Architecture
//!
//! The load manager loop owns the I/O side (load reports, broker registrations,
//! ownership records). On each decision it:
//! 1. Builds the candidate broker set and a [`LoadData`] snapshot
//! 2. Calls [`PlacementManager::select_broker`] (or a strategy directly)
//! 3. Persists the returned owner, or retries later on `None`
//!
//! When brokers join or leave it calls [`PlacementManager::on_active_brokers_change`]
//! so strategies forget brokers that are gone.

pub mod config;
pub mod errors;
pub mod load_data;
mod manager;
mod rankings;
pub mod strategy;

// Re-export main types
pub use config::{LoadManagerConfig, PlacementStrategyKind, ResourceWeights, ScoreAggregation};
pub use errors::{PlacementError, Result};
pub use load_data::{
    BrokerData, BrokerId, BundleId, LoadData, LocalBrokerData, ResourceUsage, TimeAverageBrokerData,
};
pub use manager::PlacementManager;
pub use strategy::{
    build_strategy, BoxedStrategy, LeastMessageRate, LeastWeightedUsage, PlacementStrategy,
    StickyShedder,
};
