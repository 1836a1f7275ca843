//! Chain memoization
//!
//! Chains are keyed by a hash of the attribute, its normalized rules and the
//! registry generation. Editing the rules of an attribute or registering a
//! rule therefore never hands back a stale chain, without any explicit
//! invalidation.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::OrderedChain;
use crate::foundation::GuardResult;
use crate::spec::NormalizedRules;

/// Default cache capacity (256 chains).
pub const DEFAULT_CACHE_CAPACITY: u64 = 256;

/// Per-session store of built chains.
#[derive(Clone)]
pub struct ChainCache {
    cache: moka::sync::Cache<u64, Arc<OrderedChain>>,
}

impl Default for ChainCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl fmt::Debug for ChainCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl ChainCache {
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            cache: moka::sync::Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Returns the cached chain or builds and stores a new one.
    ///
    /// Build failures are not cached.
    pub fn get_or_build(
        &self,
        attribute: &str,
        rules: &NormalizedRules,
        generation: u64,
        build: impl FnOnce() -> GuardResult<OrderedChain>,
    ) -> GuardResult<Arc<OrderedChain>> {
        let key = compute_hash(&(attribute, rules, generation));
        if let Some(chain) = self.cache.get(&key) {
            return Ok(chain);
        }
        let chain = Arc::new(build()?);
        self.cache.insert(key, chain.clone());
        Ok(chain)
    }

    /// Number of cached chains.
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }
}

fn compute_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{RuleSpec, normalize};
    use std::cell::Cell;

    fn rules(spec: &str) -> NormalizedRules {
        normalize("field", &RuleSpec::from(spec)).unwrap()
    }

    #[test]
    fn test_hit_skips_build() {
        let cache = ChainCache::default();
        let builds = Cell::new(0);
        let build = || {
            builds.set(builds.get() + 1);
            Ok(OrderedChain::new("field", Vec::new()))
        };

        let first = cache.get_or_build("field", &rules("required"), 0, build).unwrap();
        let second = cache.get_or_build("field", &rules("required"), 0, build).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_rules_or_generation_miss() {
        let cache = ChainCache::default();
        let build = || Ok(OrderedChain::new("field", Vec::new()));
        cache.get_or_build("field", &rules("required"), 0, build).unwrap();
        cache.get_or_build("field", &rules("required|min:2"), 0, build).unwrap();
        cache.get_or_build("field", &rules("required"), 1, build).unwrap();
        cache.get_or_build("other", &rules("required"), 0, build).unwrap();
        assert_eq!(cache.len(), 4);

        cache.clear();
        assert!(cache.is_empty());
    }
}
