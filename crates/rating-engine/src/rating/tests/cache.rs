use std::time::Duration;

use super::common::*;
use crate::rating::cache::ResultCache;
use crate::rating::domain::EvaluationResult;
use crate::rating::executor::evaluate;

fn rated() -> EvaluationResult {
    evaluate(&program(vec![flat("base", 1, "Base", 500.0)]), &context()).expect("rates")
}

#[test]
fn hit_returns_the_stored_result() {
    let cache = ResultCache::new(8, Duration::from_secs(60));
    let result = rated();

    cache.insert("fp-1".to_string(), result.clone());

    let hit = cache.get("fp-1").expect("cached");
    assert_eq!(hit.final_premium, result.final_premium);
    assert_eq!(hit.result_hash, result.result_hash);
}

#[test]
fn miss_on_unknown_fingerprint() {
    let cache = ResultCache::new(8, Duration::from_secs(60));
    assert!(cache.get("nope").is_none());
    assert!(cache.is_empty());
}

#[test]
fn zero_ttl_expires_immediately() {
    let cache = ResultCache::new(8, Duration::ZERO);
    cache.insert("fp-1".to_string(), rated());
    assert!(cache.get("fp-1").is_none());
}

#[test]
fn capacity_evicts_least_recently_used() {
    let cache = ResultCache::new(2, Duration::from_secs(60));
    cache.insert("a".to_string(), rated());
    cache.insert("b".to_string(), rated());

    // Touch `a` so `b` becomes the eviction candidate.
    assert!(cache.get("a").is_some());
    cache.insert("c".to_string(), rated());

    assert!(cache.get("a").is_some());
    assert!(cache.get("b").is_none());
    assert!(cache.get("c").is_some());
    assert_eq!(cache.len(), 2);
}

#[test]
fn zero_capacity_disables_caching() {
    let cache = ResultCache::new(0, Duration::from_secs(60));
    cache.insert("a".to_string(), rated());
    assert!(cache.get("a").is_none());
}

#[test]
fn reinserting_a_key_replaces_without_eviction() {
    let cache = ResultCache::new(2, Duration::from_secs(60));
    cache.insert("a".to_string(), rated());
    cache.insert("b".to_string(), rated());
    cache.insert("a".to_string(), rated());

    assert_eq!(cache.len(), 2);
    assert!(cache.get("b").is_some());
}
