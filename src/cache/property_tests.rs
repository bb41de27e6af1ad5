//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check coordinator statistics against a model and the glob
//! matcher against straightforward string predicates.

use proptest::prelude::*;
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::backend::MemoryBackend;
use crate::cache::{CacheCoordinator, GlobPattern};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_TTL: u64 = 300;

// == Strategies ==
/// Keys drawn from a small space so sequences revisit them
fn key_strategy() -> impl Strategy<Value = String> {
    "[ab]:[0-3]".prop_map(|s| s)
}

/// Arbitrary key-ish text, including glob metacharacters
fn text_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9:*?\\[\\]\\\\^-]{0,24}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

/// Escapes every glob metacharacter so the pattern matches `text` literally.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // *For any* sequence of lookups and invalidations, hits and misses match a
    // model of which keys are cached, and every miss costs exactly one fetch.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..40)) {
        let (hits, misses, fetches, expected_hits, expected_misses) = runtime().block_on(async {
            let cache = CacheCoordinator::new(Arc::new(MemoryBackend::new(TEST_MAX_ENTRIES)));
            let fetches = Arc::new(AtomicU64::new(0));
            let mut cached = HashSet::new();
            let (mut expected_hits, mut expected_misses) = (0u64, 0u64);

            for op in ops {
                match op {
                    CacheOp::Get { key } => {
                        if cached.contains(&key) {
                            expected_hits += 1;
                        } else {
                            expected_misses += 1;
                            cached.insert(key.clone());
                        }
                        let counter = Arc::clone(&fetches);
                        let value = key.clone();
                        let got: String = cache
                            .get(&key, move || async move {
                                counter.fetch_add(1, Ordering::SeqCst);
                                Ok::<_, Infallible>(value)
                            }, TEST_TTL)
                            .await
                            .unwrap();
                        assert_eq!(got, key);
                    }
                    CacheOp::Delete { key } => {
                        cached.remove(&key);
                        cache.delete(&key).await;
                    }
                }
            }

            let stats = cache.stats();
            (stats.hits, stats.misses, fetches.load(Ordering::SeqCst), expected_hits, expected_misses)
        });

        prop_assert_eq!(hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(fetches, expected_misses, "Fetch count mismatch");
    }

    // *For any* text, the fully escaped pattern matches exactly that text.
    #[test]
    fn prop_escaped_pattern_matches_itself(text in text_strategy(), other in text_strategy()) {
        let pattern = GlobPattern::new(&escape(&text));
        prop_assert!(pattern.matches(&text));
        prop_assert_eq!(pattern.matches(&other), other == text);
    }

    // *For any* prefix, `prefix*` matches exactly the keys starting with it.
    #[test]
    fn prop_prefix_star(prefix in text_strategy(), key in text_strategy()) {
        let pattern = GlobPattern::new(&format!("{}*", escape(&prefix)));
        prop_assert_eq!(pattern.matches(&key), key.starts_with(&prefix));
        let joined = format!("{}{}", prefix, key);
        prop_assert!(pattern.matches(&joined));
    }

    // *For any* key, `*` matches and `?` matches only single characters.
    #[test]
    fn prop_wildcards(key in text_strategy()) {
        prop_assert!(GlobPattern::new("*").matches(&key));
        prop_assert_eq!(GlobPattern::new("?").matches(&key), key.chars().count() == 1);
    }
}
