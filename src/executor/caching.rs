//! 二级缓存执行器
//!
//! 只对所属 mapper 声明了缓存的语句生效。会话内的查询结果先暂存在
//! `TransactionCacheManager` 中，`commit` 之后才对其他会话可见。

use crate::data::cache::{CacheKey, TransactionCacheManager};
use crate::data::Result;
use crate::executor::Executor;
use crate::session::Configuration;
use crate::types::ResultList;
use serde_json::Value as JsonValue;
use std::sync::Arc;

pub struct CachingExecutor {
    delegate: Box<dyn Executor>,
    configuration: Arc<Configuration>,
    tcm: TransactionCacheManager,
}

impl CachingExecutor {
    pub fn new(delegate: Box<dyn Executor>, configuration: Arc<Configuration>) -> Self {
        Self {
            delegate,
            configuration,
            tcm: TransactionCacheManager::new(),
        }
    }

    /// 会话内已接触过的二级缓存
    pub fn transaction_caches(&self) -> &TransactionCacheManager {
        &self.tcm
    }
}

impl Executor for CachingExecutor {
    fn select(&mut self, statement_id: &str, param: Option<&JsonValue>) -> Result<ResultList> {
        let statement = self.configuration.mapped_statement(statement_id)?;
        let cache = match statement.cache() {
            Some(cache) => Arc::clone(cache),
            None => return self.delegate.select(statement_id, param),
        };

        let key = CacheKey::new(statement_id, param);
        if let Some(list) = self.tcm.get(&cache, &key) {
            tracing::debug!(cache_id = cache.id(), key = %key, "二级缓存命中");
            return Ok(list);
        }

        tracing::debug!(cache_id = cache.id(), key = %key, "二级缓存未命中");
        let list = self.delegate.select(statement_id, param)?;
        self.tcm.put(&cache, key, list.clone());
        Ok(list)
    }

    // 写语句不会清空任何缓存：同一语句 + 参数在其他会话或本会话中
    // 仍会读到写入前缓存的结果，直到缓存被显式清理
    fn update(&mut self, statement_id: &str, param: Option<&JsonValue>) -> Result<usize> {
        self.delegate.update(statement_id, param)
    }

    fn insert(&mut self, statement_id: &str, param: Option<&JsonValue>) -> Result<usize> {
        self.delegate.insert(statement_id, param)
    }

    fn delete(&mut self, statement_id: &str, param: Option<&JsonValue>) -> Result<usize> {
        self.delegate.delete(statement_id, param)
    }

    fn commit(&mut self) {
        self.delegate.commit();
        self.tcm.commit();
    }

    fn rollback(&mut self) {
        self.delegate.rollback();
        self.tcm.rollback();
    }
}
