//! 事务缓存管理器
//!
//! 每个会话一个，按共享 `Cache` 的实例身份惰性创建对应的 `TransactionalCache`，
//! 会话提交时统一刷入。刷入不是跨缓存原子的。

use super::{Cache, CacheKey, TransactionalCache};
use crate::types::ResultList;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct TransactionCacheManager {
    // 键为 `Arc<Cache>` 的地址；包装器持有 Arc，地址在会话期内不会被复用
    transactional_caches: HashMap<usize, TransactionalCache>,
}

impl TransactionCacheManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, cache: &Arc<Cache>, key: &CacheKey) -> Option<ResultList> {
        self.transactional_cache(cache).get(key)
    }

    pub fn put(&mut self, cache: &Arc<Cache>, key: CacheKey, value: ResultList) {
        self.transactional_cache(cache).put(key, value);
    }

    pub fn commit(&mut self) {
        for tx_cache in self.transactional_caches.values_mut() {
            tracing::debug!(
                cache_id = tx_cache.delegate().id(),
                entries = tx_cache.pending(),
                "刷入二级缓存"
            );
            tx_cache.commit();
        }
    }

    pub fn rollback(&mut self) {
        for tx_cache in self.transactional_caches.values_mut() {
            tx_cache.rollback();
        }
    }

    /// 当前会话已接触过的共享缓存数量
    pub fn len(&self) -> usize {
        self.transactional_caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactional_caches.is_empty()
    }

    fn transactional_cache(&mut self, cache: &Arc<Cache>) -> &mut TransactionalCache {
        self.transactional_caches
            .entry(Arc::as_ptr(cache) as usize)
            .or_insert_with(|| TransactionalCache::new(Arc::clone(cache)))
    }
}
