//! 数据访问层
//!
//! # 模块组织
//!
//! - `error`: 统一错误类型定义
//! - `cache`: 两级查询缓存（共享缓存 + 会话级事务缓存）
//! - `datasource`: 连接提供者接口与 SQLite 实现

pub mod cache;
pub mod datasource;
pub mod error;

pub use datasource::{DataSource, PooledConnection, SqliteDataSource};
pub use error::{PersistenceError, Result};
