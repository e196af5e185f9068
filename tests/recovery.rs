//! Recovery probe tests against real mock backends.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swan_cluster::{Cluster, ClusterError, MemberStatus};

mod common;

fn cluster(endpoints: &str) -> Cluster {
    Cluster::builder(endpoints)
        .client(common::probe_client())
        .ping_path("ping")
        .probe_interval(Duration::from_millis(100))
        .probe_timeout(Duration::from_secs(1))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_member_recovers_after_probe_succeeds() {
    let calls = Arc::new(AtomicU32::new(0));
    let cc = calls.clone();
    let addr = common::start_programmable_backend(move || {
        let cc = cc.clone();
        async move {
            // two failed probes before the node comes back
            if cc.fetch_add(1, Ordering::SeqCst) < 2 {
                503
            } else {
                200
            }
        }
    })
    .await;

    let endpoint = format!("http://{}", addr);
    let c = cluster(&endpoint);
    c.demote(&endpoint);

    assert_eq!(c.inactive_members(), vec![endpoint.clone()]);
    assert!(c.active_members().is_empty());
    assert!(matches!(c.select(), Err(ClusterError::NoHealthyEndpoint)));

    let recovered = common::wait_until(Duration::from_secs(5), || {
        c.list_by_status(MemberStatus::Up) == vec![endpoint.clone()]
    })
    .await;
    assert!(recovered, "member should be marked up after the probe succeeds");

    assert!(c.inactive_members().is_empty());
    assert_eq!(c.select().unwrap(), endpoint);
    assert!(calls.load(Ordering::SeqCst) >= 3, "probe should retry until 200");
    assert_eq!(c.probes_started(), 1);

    // the probe task exits once the member is back
    assert!(common::wait_until(Duration::from_secs(1), || c.active_probes() == 0).await);
}

#[tokio::test]
async fn test_second_demotion_after_recovery_restarts_recovery() {
    let calls = Arc::new(AtomicU32::new(0));
    let cc = calls.clone();
    let addr = common::start_programmable_backend(move || {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            200
        }
    })
    .await;

    let endpoint = format!("http://{}", addr);
    let c = cluster(&endpoint);
    let is_up = || c.active_members() == vec![endpoint.clone()];

    c.demote(&endpoint);
    assert!(common::wait_until(Duration::from_secs(5), is_up).await);
    assert!(common::wait_until(Duration::from_secs(1), || c.active_probes() == 0).await);
    assert_eq!(c.probes_started(), 1);

    // a recovered member goes through the full cycle again
    c.demote(&endpoint);
    assert_eq!(c.inactive_members(), vec![endpoint.clone()]);
    assert_eq!(c.probes_started(), 2);

    assert!(common::wait_until(Duration::from_secs(5), is_up).await);
    assert!(calls.load(Ordering::SeqCst) >= 2);
    assert_eq!(c.probes_started(), 2);
}

#[tokio::test]
async fn test_failover_and_failback() {
    let b1_healthy = Arc::new(AtomicBool::new(false));
    let b1h = b1_healthy.clone();
    let b1 = common::start_programmable_backend(move || {
        let b1h = b1h.clone();
        async move {
            if b1h.load(Ordering::SeqCst) {
                200
            } else {
                500
            }
        }
    })
    .await;
    let b2 = common::start_programmable_backend(|| async { 200 }).await;

    // second entry relies on the first entry's scheme
    let c = cluster(&format!("http://{},{}", b1, b2));
    let first = format!("http://{}", b1);
    let second = format!("http://{}", b2);

    assert_eq!(c.select().unwrap(), first);
    c.demote(&first);
    assert_eq!(c.select().unwrap(), second);

    // still failing, so it stays down across several probe intervals
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(c.inactive_members(), vec![first.clone()]);

    b1_healthy.store(true, Ordering::SeqCst);
    assert!(common::wait_until(Duration::from_secs(5), || c.inactive_members().is_empty()).await);
    assert_eq!(c.select().unwrap(), first);
    assert_eq!(c.size(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_demotion_storm_probes_once() {
    let hits = Arc::new(AtomicU32::new(0));
    let h = hits.clone();
    let addr = common::start_programmable_backend(move || {
        let h = h.clone();
        async move {
            h.fetch_add(1, Ordering::SeqCst);
            503
        }
    })
    .await;

    let endpoint = format!("http://{}", addr);
    let c = Arc::new(
        Cluster::builder(endpoint.as_str())
            .client(common::probe_client())
            .probe_interval(Duration::from_secs(60))
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let c = c.clone();
            let endpoint = endpoint.clone();
            tokio::spawn(async move { c.demote(&endpoint) })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(c.probes_started(), 1);
    assert!(common::wait_until(Duration::from_secs(2), || hits.load(Ordering::SeqCst) >= 1).await);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1, "exactly one probe should hit the backend");

    c.shutdown().await;
    assert_eq!(c.active_probes(), 0);
    assert_eq!(c.inactive_members(), vec![endpoint]);
}

#[tokio::test]
async fn test_shutdown_interrupts_probe_wait() {
    let addr = common::start_programmable_backend(|| async { 503 }).await;
    let endpoint = format!("http://{}", addr);
    let c = Cluster::builder(endpoint.as_str())
        .client(common::probe_client())
        .probe_interval(Duration::from_secs(3600))
        .build()
        .unwrap();

    c.demote(&endpoint);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(c.active_probes(), 1);

    tokio::time::timeout(Duration::from_secs(2), c.shutdown())
        .await
        .expect("shutdown should not wait out the probe interval");
    assert_eq!(c.active_probes(), 0);
    assert_eq!(c.inactive_members(), vec![endpoint]);
}
