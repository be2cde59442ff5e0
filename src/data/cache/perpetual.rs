//! 共享缓存
//!
//! 按 mapper 命名空间创建，进程内所有会话共享同一实例，因此内部存储由 `RwLock` 保护。
//! 不做容量限制和过期淘汰。

use super::CacheKey;
use crate::types::ResultList;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// 二级缓存存储单元
#[derive(Debug)]
pub struct Cache {
    id: String,
    entries: RwLock<HashMap<CacheKey, ResultList>>,
}

impl Cache {
    /// 创建新的缓存
    ///
    /// # 参数
    ///
    /// - `id`: 缓存 ID，在注册表内唯一（通常为 mapper 命名空间）
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// 写入缓存项，已存在的键被覆盖（后写者胜）
    pub fn put(&self, key: CacheKey, value: ResultList) {
        // 每次修改都是单步完成的，锁中毒后 map 依然一致
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, value);
    }

    /// 获取缓存项
    pub fn get(&self, key: &CacheKey) -> Option<ResultList> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    /// 清空所有缓存
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
    }

    /// 获取当前缓存项数量
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 检查缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
