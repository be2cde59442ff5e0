//! 缓存层实现
//!
//! 提供两级查询缓存的构件：
//! - `key`: 缓存键（语句 ID + 参数摘要）
//! - `perpetual`: 跨会话共享的二级缓存存储
//! - `transactional`: 会话级写缓冲，提交时刷入共享缓存
//! - `manager`: 会话内所有事务缓存的注册表

pub mod key;
pub mod manager;
pub mod perpetual;
pub mod transactional;

pub use key::CacheKey;
pub use manager::TransactionCacheManager;
pub use perpetual::Cache;
pub use transactional::TransactionalCache;
