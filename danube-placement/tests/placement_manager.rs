//! Integration tests driving placement through `PlacementManager`, the way the
//! load manager loop uses it.

mod common;

use common::{brokers, init_tracing, set_cpu, snapshot};
use danube_placement::{
    BrokerId, BundleId, LeastWeightedUsage, LoadManagerConfig, PlacementError, PlacementManager,
    PlacementStrategyKind, Result, StickyShedder,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// **Test:** Default Configuration Places by Message Rate
///
/// **Expectation:** The default strategy is least message rate; the quietest broker wins
/// until it gets overloaded, then the next quietest one does.
#[tokio::test]
async fn default_manager_places_by_message_rate() -> Result<()> {
    init_tracing();
    let manager = PlacementManager::new(LoadManagerConfig::default())?;
    assert_eq!(
        manager.strategy_kind().await,
        PlacementStrategyKind::LeastMessageRate
    );

    let candidates = brokers(&["1", "2", "3"]);
    let bundle = BundleId::from("tenant/ns/0x00000000_0xffffffff");
    let mut load_data = snapshot(&[("1", 10.0, 100.0), ("2", 10.0, 200.0), ("3", 10.0, 300.0)]);

    assert_eq!(
        manager.select_broker(&candidates, &bundle, &load_data).await,
        Some(BrokerId::from("1"))
    );

    set_cpu(&mut load_data, "1", 90.0);
    assert_eq!(
        manager.select_broker(&candidates, &bundle, &load_data).await,
        Some(BrokerId::from("2"))
    );

    assert_eq!(
        manager.select_broker(&brokers(&[]), &bundle, &load_data).await,
        None
    );
    Ok(())
}

/// **Test:** Invalid Configuration Is Rejected
///
/// **Expectation:** Construction and reconfiguration both fail with `InvalidConfig`, and
/// a rejected update leaves the previous configuration in place.
#[tokio::test]
async fn invalid_config_is_rejected() -> Result<()> {
    let mut config = LoadManagerConfig::default();
    config.history_resource_percentage = -0.1;
    assert!(matches!(
        PlacementManager::new(config.clone()),
        Err(PlacementError::InvalidConfig(_))
    ));

    let manager = PlacementManager::new(LoadManagerConfig::default())?;
    assert!(manager.update_config(config).await.is_err());
    assert_eq!(manager.config().await, LoadManagerConfig::default());
    Ok(())
}

/// **Test:** Strategy Swap Only on Kind Change
///
/// **Reason:** Swapping a strategy discards its memory (sticky assignments, usage
/// history), so a config update that keeps the same kind must not reset it.
///
/// **Expectation:** A sticky assignment survives an update with the same kind, and is lost
/// once the kind changes away and back.
#[tokio::test]
async fn strategy_swapped_only_on_kind_change() -> Result<()> {
    init_tracing();
    let config = LoadManagerConfig {
        strategy: PlacementStrategyKind::StickyShedder,
        ..LoadManagerConfig::default()
    };
    let strategy = StickyShedder::with_rng(StdRng::seed_from_u64(3));
    let manager = PlacementManager::with_strategy(config.clone(), Box::new(strategy))?;

    let all = brokers(&["a", "b", "c", "d", "e", "f", "g", "h"]);
    let load_data = snapshot(&[]);
    let bundles: Vec<BundleId> = (0..16)
        .map(|i| BundleId::new(format!("tenant/ns/bundle-{}", i)))
        .collect();

    let mut owners = Vec::new();
    for bundle in &bundles {
        owners.push(manager.select_broker(&all, bundle, &load_data).await);
    }

    // same kind, new thresholds: assignments are kept
    let mut tuned = config.clone();
    tuned.broker_overloaded_threshold_percentage = 70.0;
    manager.update_config(tuned).await?;
    assert_eq!(manager.config().await.broker_overloaded_threshold_percentage, 70.0);
    for (bundle, owner) in bundles.iter().zip(&owners) {
        assert_eq!(&manager.select_broker(&all, bundle, &load_data).await, owner);
    }

    // switching kind resets the strategy
    manager
        .update_config(LoadManagerConfig {
            strategy: PlacementStrategyKind::LeastWeightedUsage,
            ..config.clone()
        })
        .await?;
    assert_eq!(
        manager.strategy_kind().await,
        PlacementStrategyKind::LeastWeightedUsage
    );
    manager.update_config(config).await?;
    assert_eq!(manager.strategy_kind().await, PlacementStrategyKind::StickyShedder);

    let mut moved = 0;
    for (bundle, owner) in bundles.iter().zip(&owners) {
        let selected = manager.select_broker(&all, bundle, &load_data).await;
        assert!(all.contains(selected.as_ref().unwrap()));
        if &selected != owner {
            moved += 1;
        }
    }
    // 16 fresh random draws over 8 brokers all matching the old owners is practically impossible
    assert!(moved > 0);
    Ok(())
}

/// **Test:** Forgotten Bundles Are Placed Afresh
///
/// **Reason:** Bundles that were unloaded, split or deleted must not keep pinning a
/// sticky owner, and the load manager only reaches the strategy through the manager.
///
/// **Expectation:** Bundles pinned to broker `a` stay there while remembered. Once
/// forgotten, the manager reports `a` as their previous owner and later placements are
/// drawn again across all brokers. Strategies without bundle memory report nothing.
#[tokio::test]
async fn forgotten_bundles_are_placed_afresh() -> Result<()> {
    init_tracing();
    let config = LoadManagerConfig {
        strategy: PlacementStrategyKind::StickyShedder,
        ..LoadManagerConfig::default()
    };
    let strategy = StickyShedder::with_rng(StdRng::seed_from_u64(11));
    let manager = PlacementManager::with_strategy(config, Box::new(strategy))?;

    let only_a = brokers(&["a"]);
    let all = brokers(&["a", "b", "c", "d", "e", "f", "g", "h"]);
    let load_data = snapshot(&[]);
    let bundles: Vec<BundleId> = (0..16)
        .map(|i| BundleId::new(format!("tenant/ns/bundle-{}", i)))
        .collect();

    for bundle in &bundles {
        assert_eq!(
            manager.select_broker(&only_a, bundle, &load_data).await,
            Some(BrokerId::from("a"))
        );
    }
    // remembered bundles stay on `a` even with more candidates around
    assert_eq!(
        manager.select_broker(&all, &bundles[0], &load_data).await,
        Some(BrokerId::from("a"))
    );

    for bundle in &bundles {
        assert_eq!(manager.forget_bundle(bundle).await, Some(BrokerId::from("a")));
        assert_eq!(manager.forget_bundle(bundle).await, None);
    }

    let mut moved = 0;
    for bundle in &bundles {
        let selected = manager.select_broker(&all, bundle, &load_data).await;
        if selected != Some(BrokerId::from("a")) {
            moved += 1;
        }
    }
    // 16 fresh draws over 8 brokers all landing on `a` is practically impossible
    assert!(moved > 0);

    let stateless = PlacementManager::new(LoadManagerConfig::default())?;
    assert_eq!(stateless.forget_bundle(&bundles[0]).await, None);
    Ok(())
}

/// **Test:** Weighted Usage Through the Manager With Broker Churn
///
/// **Expectation:** The least loaded broker is chosen; after it leaves the cluster and the
/// manager is told, placement continues on the remaining brokers.
#[tokio::test]
async fn weighted_usage_with_broker_churn() -> Result<()> {
    init_tracing();
    let config = LoadManagerConfig {
        strategy: PlacementStrategyKind::LeastWeightedUsage,
        history_resource_percentage: 0.5,
        average_usage_difference_threshold_percentage: 5.0,
        ..LoadManagerConfig::default()
    };
    let strategy = LeastWeightedUsage::with_rng(StdRng::seed_from_u64(8));
    let manager = PlacementManager::with_strategy(config, Box::new(strategy))?;

    let bundle = BundleId::from("tenant/ns/0x00000000_0x80000000");
    let load_data = snapshot(&[("1", 10.0, 0.0), ("2", 30.0, 0.0), ("3", 60.0, 0.0)]);

    assert_eq!(
        manager
            .select_broker(&brokers(&["1", "2", "3"]), &bundle, &load_data)
            .await,
        Some(BrokerId::from("1"))
    );

    let remaining = brokers(&["2", "3"]);
    manager.on_active_brokers_change(&remaining).await;
    assert_eq!(
        manager.select_broker(&remaining, &bundle, &load_data).await,
        Some(BrokerId::from("2"))
    );
    Ok(())
}

/// **Test:** Assignment Callback
///
/// **Expectation:** The callback fires once per successful placement and never for a
/// deferred one.
#[tokio::test]
async fn assignment_callback_counts_placements() -> Result<()> {
    let placed = Arc::new(AtomicUsize::new(0));
    let counter = placed.clone();
    let manager = PlacementManager::new(LoadManagerConfig::default())?
        .with_assignment_callback(move |_broker, _bundle| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

    let load_data = snapshot(&[("1", 10.0, 100.0), ("2", 95.0, 0.0)]);
    let bundle = BundleId::from("tenant/ns/bundle");

    manager.select_broker(&brokers(&["1", "2"]), &bundle, &load_data).await;
    manager.select_broker(&brokers(&["2"]), &bundle, &load_data).await;
    manager.select_broker(&brokers(&[]), &bundle, &load_data).await;

    assert_eq!(placed.load(Ordering::SeqCst), 1);
    Ok(())
}

/// **Test:** Concurrent Callers Share One Strategy
///
/// **Reason:** The manager is cloned into several tasks of the load manager; decisions
/// must be serialized so no sticky assignment is lost.
///
/// **Expectation:** Bundles placed concurrently keep their owner on a follow-up pass.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_keep_assignments() -> Result<()> {
    let config = LoadManagerConfig {
        strategy: PlacementStrategyKind::StickyShedder,
        ..LoadManagerConfig::default()
    };
    let manager = PlacementManager::new(config)?;
    let candidates = brokers(&["1", "2", "3"]);
    let load_data = snapshot(&[]);

    let mut handles = Vec::new();
    for i in 0..32 {
        let manager = manager.clone();
        let candidates = candidates.clone();
        let load_data = load_data.clone();
        handles.push(tokio::spawn(async move {
            let bundle = BundleId::new(format!("tenant/ns/bundle-{}", i));
            let owner = manager.select_broker(&candidates, &bundle, &load_data).await;
            (bundle, owner)
        }));
    }

    for handle in handles {
        let (bundle, owner) = handle.await.expect("placement task panicked");
        assert!(owner.is_some());
        assert_eq!(
            manager.select_broker(&candidates, &bundle, &load_data).await,
            owner
        );
    }
    Ok(())
}
