/*!
 * Tests for translation cache functionality
 */

use csvbridge::translation::cache::TranslationCache;

#[test]
fn test_cache_new_withDisabled_shouldNeverHit() {
    let cache = TranslationCache::new(false);
    cache.store("你好", "zh-CN", "en", "hello");

    assert!(cache.get("你好", "zh-CN", "en").is_none());
    assert!(!cache.is_enabled());
    assert!(cache.is_empty());
}

#[test]
fn test_cache_store_withEnabledCache_shouldStoreTranslation() {
    let cache = TranslationCache::new(true);
    cache.store("你好", "zh-CN", "en", "hello");

    assert_eq!(cache.get("你好", "zh-CN", "en"), Some("hello".to_string()));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_cache_get_withDifferentLanguages_shouldReturnNone() {
    let cache = TranslationCache::new(true);
    cache.store("你好", "zh-CN", "en", "hello");

    assert!(cache.get("你好", "zh-CN", "tr").is_none());
    assert!(cache.get("你好", "ja", "en").is_none());
}

#[test]
fn test_cache_store_withSameKey_shouldOverwrite() {
    let cache = TranslationCache::new(true);
    cache.store("你好", "zh-CN", "en", "hello");
    cache.store("你好", "zh-CN", "en", "hi");

    assert_eq!(cache.get("你好", "zh-CN", "en"), Some("hi".to_string()));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_cache_stats_shouldCountHitsAndMisses() {
    let cache = TranslationCache::new(true);
    cache.store("你好", "zh-CN", "en", "hello");

    let _ = cache.get("你好", "zh-CN", "en");
    let _ = cache.get("你好", "zh-CN", "en");
    let _ = cache.get("世界", "zh-CN", "en");

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.entries, 1);
    assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_cache_clone_shouldShareEntries() {
    let cache = TranslationCache::new(true);
    let clone = cache.clone();
    clone.store("你好", "zh-CN", "en", "hello");

    assert_eq!(cache.get("你好", "zh-CN", "en"), Some("hello".to_string()));
}
