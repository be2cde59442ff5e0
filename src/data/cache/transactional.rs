//! 事务缓存
//!
//! 包装一个共享 `Cache`：读直接穿透到底层缓存，写只暂存在本地缓冲区，
//! `commit` 时才刷入底层缓存。同一事务内也读不到自己暂存的写入。

use super::{Cache, CacheKey};
use crate::types::ResultList;
use std::collections::HashMap;
use std::sync::Arc;

/// 单个会话对单个共享缓存的写缓冲
#[derive(Debug)]
pub struct TransactionalCache {
    delegate: Arc<Cache>,
    entries_to_add_on_commit: HashMap<CacheKey, ResultList>,
}

impl TransactionalCache {
    pub fn new(delegate: Arc<Cache>) -> Self {
        Self {
            delegate,
            entries_to_add_on_commit: HashMap::new(),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<ResultList> {
        self.delegate.get(key)
    }

    pub fn put(&mut self, key: CacheKey, value: ResultList) {
        self.entries_to_add_on_commit.insert(key, value);
    }

    /// 将暂存项全部刷入底层缓存，刷入后缓冲区清空
    pub fn commit(&mut self) {
        for (key, value) in self.entries_to_add_on_commit.drain() {
            self.delegate.put(key, value);
        }
    }

    /// 丢弃所有暂存项
    pub fn rollback(&mut self) {
        self.entries_to_add_on_commit.clear();
    }

    /// 尚未提交的暂存项数量
    pub fn pending(&self) -> usize {
        self.entries_to_add_on_commit.len()
    }

    pub fn delegate(&self) -> &Arc<Cache> {
        &self.delegate
    }
}
