//! 会话层
//!
//! # 模块组织
//!
//! - `configuration`: 语句、类型、缓存与 mapper 接口的注册表
//! - `sql_session`: 会话接口与默认实现
//! - `factory`: 会话工厂及其构建器

pub mod configuration;
pub mod factory;
pub mod sql_session;


pub use configuration::{Configuration, MapperBuilder};
pub use factory::{SqlSessionFactory, SqlSessionFactoryBuilder};
pub use sql_session::{DefaultSqlSession, Selected, SqlSession};
