use super::*;
use crate::model::{ApiKey, AuthConfig, KeyLocation};
use crate::state::test_helpers::{dummy_endpoint, keyed_endpoint, rpm_key, seed_endpoint, test_app_state};

#[tokio::test]
async fn unknown_endpoint_is_not_found() {
    let state = test_app_state();
    let result = record_hit_at(&state, "missing", 0).await;
    assert!(matches!(result.unwrap_err(), HitError::NotFound(_)));
}

#[tokio::test]
async fn hit_without_api_key_auth_is_noop_success() {
    let state = test_app_state();
    seed_endpoint(&state, dummy_endpoint("plain")).await;

    let outcome = record_hit_at(&state, "plain", 1_000).await.unwrap();
    assert!(outcome.chosen_key.is_none());
    assert!(outcome.endpoint.key_pool().is_none());
}

#[tokio::test]
async fn hit_stamps_chosen_key_ledger() {
    let state = test_app_state();
    seed_endpoint(&state, keyed_endpoint("e", vec![ApiKey::new("k1")])).await;

    let outcome = record_hit_at(&state, "e", 5_000).await.unwrap();
    assert_eq!(outcome.chosen_key.as_deref(), Some("k1"));

    let key = &outcome.endpoint.key_pool().unwrap()[0];
    assert_eq!(key.usage, 1);
    assert_eq!(key.last_used, Some(5_000));
    assert_eq!(key.usage_history, vec![5_000]);

    // The mutation was persisted, not just returned.
    let stored = state.store.get("e").await.unwrap();
    assert_eq!(stored.key_pool().unwrap()[0].usage, 1);
}

#[tokio::test]
async fn exhausted_pool_fails_without_mutation() {
    let state = test_app_state();
    let mut key = rpm_key("k1", 1);
    key.usage = 1;
    key.usage_history = vec![1_000];
    seed_endpoint(&state, keyed_endpoint("e", vec![key])).await;

    let result = record_hit_at(&state, "e", 2_000).await;
    assert!(matches!(result.unwrap_err(), HitError::AllKeysRateLimited(id) if id == "e"));

    let stored = state.store.get("e").await.unwrap();
    let key = &stored.key_pool().unwrap()[0];
    assert_eq!(key.usage, 1);
    assert_eq!(key.usage_history, vec![1_000]);
}

#[tokio::test]
async fn overflow_traffic_moves_to_second_key() {
    let state = test_app_state();
    // k1 caps at zero: limited from the first evaluation onward.
    seed_endpoint(&state, keyed_endpoint("e", vec![rpm_key("k1", 0), ApiKey::new("k2")])).await;

    for now in [1_000, 2_000, 3_000] {
        let outcome = record_hit_at(&state, "e", now).await.unwrap();
        assert_eq!(outcome.chosen_key.as_deref(), Some("k2"));
    }

    let stored = state.store.get("e").await.unwrap();
    let pool = stored.key_pool().unwrap();
    assert_eq!(pool[0].usage, 0);
    assert_eq!(pool[1].usage, 3);
}

#[tokio::test]
async fn minute_window_scenario() {
    let state = test_app_state();
    seed_endpoint(&state, keyed_endpoint("e", vec![rpm_key("k", 2)])).await;

    // Two hits inside the window succeed.
    record_hit_at(&state, "e", 0).await.unwrap();
    record_hit_at(&state, "e", 1_000).await.unwrap();
    let stored = state.store.get("e").await.unwrap();
    assert_eq!(stored.key_pool().unwrap()[0].usage, 2);

    // Third hit at t=2s: both prior hits still in the 60s window.
    let result = record_hit_at(&state, "e", 2_000).await;
    assert!(matches!(result.unwrap_err(), HitError::AllKeysRateLimited(_)));

    // At t=61s the t=0 entry has aged out, so the hit succeeds.
    let outcome = record_hit_at(&state, "e", 61_000).await.unwrap();
    let key = &outcome.endpoint.key_pool().unwrap()[0];
    assert_eq!(key.usage, 3);
    assert_eq!(key.last_used, Some(61_000));
}

#[tokio::test]
async fn empty_pool_is_noop_success() {
    let state = test_app_state();
    let ep = crate::model::Endpoint {
        auth_config: Some(AuthConfig::ApiKey {
            name: "key".into(),
            location: KeyLocation::Query,
            values: vec![],
        }),
        ..dummy_endpoint("e")
    };
    seed_endpoint(&state, ep).await;

    let outcome = record_hit_at(&state, "e", 1_000).await.unwrap();
    assert!(outcome.chosen_key.is_none());
}

#[tokio::test]
async fn successful_hit_persists_pruned_history() {
    let state = test_app_state();
    let stale = 1_000;
    let now = crate::rate_limit::RETENTION_MS + 100_000;
    let mut key = ApiKey::new("k1");
    key.usage_history = vec![stale, now - 1_000];
    seed_endpoint(&state, keyed_endpoint("e", vec![key])).await;

    record_hit_at(&state, "e", now).await.unwrap();

    let stored = state.store.get("e").await.unwrap();
    assert_eq!(stored.key_pool().unwrap()[0].usage_history, vec![now - 1_000, now]);
}

#[tokio::test]
async fn concurrent_hits_do_not_lose_ledger_appends() {
    let state = test_app_state();
    seed_endpoint(&state, keyed_endpoint("e", vec![ApiKey::new("k1")])).await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let state = state.clone();
        handles.push(tokio::spawn(async move { record_hit(&state, "e").await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = state.store.get("e").await.unwrap();
    let key = &stored.key_pool().unwrap()[0];
    assert_eq!(key.usage, 20);
    assert_eq!(key.usage_history.len(), 20);
}
