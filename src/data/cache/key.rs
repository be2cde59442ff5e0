//! 缓存键
//!
//! 一级缓存和二级缓存共用同一种键：语句 ID + 参数对象摘要。
//! 同一语句使用不同参数调用时不会命中彼此的缓存项；无参数语句的键只含语句 ID。

use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};
use std::fmt;

/// 查询缓存键
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct CacheKey {
    statement_id: String,
    params_digest: Option<String>,
}

impl CacheKey {
    /// 创建缓存键
    ///
    /// # 参数
    ///
    /// - `statement_id`: 全局唯一的语句 ID
    /// - `param`: 序列化后的参数对象（`serde_json::Map` 按键排序，输出是规范化的）
    pub fn new(statement_id: &str, param: Option<&JsonValue>) -> Self {
        let params_digest = param.map(|value| {
            let mut hasher = Sha256::new();
            hasher.update(value.to_string().as_bytes());
            format!("{:x}", hasher.finalize())
        });

        Self {
            statement_id: statement_id.to_string(),
            params_digest,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.params_digest {
            Some(digest) => write!(f, "{}#{}", self.statement_id, &digest[..12]),
            None => write!(f, "{}", self.statement_id),
        }
    }
}
