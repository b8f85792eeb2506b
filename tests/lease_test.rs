//! Tests for scoped acquisition and reference counting.

mod common;

use common::Harness;
use gg_vram::{ManagerError, PriorityClass};

#[tokio::test]
async fn test_acquire_pins_model() {
    let h = Harness::new(1000);
    h.add("pose", 600, PriorityClass::Low);

    let lease = h.manager.acquire("pose").await.unwrap();

    assert_eq!(lease.model_id(), "pose");
    assert_eq!(lease.handle().as_str(), "pose");
    assert_eq!(lease.as_str(), "pose");
    assert_eq!(h.manager.active_refs("pose"), Some(1));
    assert_eq!(h.manager.committed_mb(), 600);
}

#[tokio::test]
async fn test_reentrant_acquire_does_not_reload() {
    let h = Harness::new(1000);
    h.add("pose", 600, PriorityClass::Low);

    let first = h.manager.acquire("pose").await.unwrap();
    let second = h.manager.acquire("pose").await.unwrap();

    assert_eq!(h.journal.loads(), 1);
    assert_eq!(h.manager.active_refs("pose"), Some(2));

    h.manager.release(first);
    assert_eq!(h.manager.active_refs("pose"), Some(1));
    assert!(h.manager.is_resident("pose"));

    drop(second);
    assert_eq!(h.manager.active_refs("pose"), Some(0));
}

#[tokio::test]
async fn test_release_keeps_model_resident() {
    let h = Harness::new(1000);
    h.add("pose", 600, PriorityClass::Low);

    {
        let _lease = h.manager.acquire("pose").await.unwrap();
    }

    assert!(h.manager.is_resident("pose"));
    assert_eq!(h.manager.committed_mb(), 600);
    assert_eq!(h.journal.unloads(), 0);
}

#[tokio::test]
async fn test_released_model_becomes_evictable() {
    let h = Harness::new(1000);
    h.add("a", 600, PriorityClass::Critical);
    h.add("b", 500, PriorityClass::Low);

    let lease = h.manager.acquire("a").await.unwrap();
    assert!(matches!(
        h.manager.fetch("b").await,
        Err(ManagerError::BudgetExceeded { .. })
    ));

    lease.release();
    h.manager.fetch("b").await.unwrap();

    assert_eq!(h.journal.unloaded(), vec!["a"]);
    h.assert_consistent();
}

#[tokio::test]
async fn test_fetch_does_not_add_reference() {
    let h = Harness::new(1000);
    h.add("pose", 600, PriorityClass::Low);

    let lease = h.manager.acquire("pose").await.unwrap();
    h.manager.fetch("pose").await.unwrap();

    assert_eq!(h.manager.active_refs("pose"), Some(1));
    drop(lease);
    assert_eq!(h.manager.active_refs("pose"), Some(0));
}

#[tokio::test]
async fn test_lease_released_on_early_error_return() {
    async fn use_then_fail(h: &Harness) -> Result<(), ManagerError> {
        let _lease = h.manager.acquire("pose").await?;
        h.manager.fetch("ghost").await?;
        Ok(())
    }

    let h = Harness::new(1000);
    h.add("pose", 600, PriorityClass::Low);

    assert!(use_then_fail(&h).await.is_err());
    assert_eq!(h.manager.active_refs("pose"), Some(0));
}

#[tokio::test]
async fn test_lease_can_cross_tasks() {
    let h = Harness::new(1000);
    h.add("pose", 600, PriorityClass::Low);

    let lease = h.manager.acquire("pose").await.unwrap();
    let joined = tokio::spawn(async move {
        let id = lease.model_id().to_string();
        drop(lease);
        id
    })
    .await
    .unwrap();

    assert_eq!(joined, "pose");
    assert_eq!(h.manager.active_refs("pose"), Some(0));
}

#[tokio::test]
async fn test_status_reports_active_refs() {
    let h = Harness::new(1000);
    h.add("pose", 600, PriorityClass::Low);

    let _a = h.manager.acquire("pose").await.unwrap();
    let _b = h.manager.acquire("pose").await.unwrap();

    let status = h.manager.status();
    assert_eq!(status.resident[0].active_refs, 2);
}
