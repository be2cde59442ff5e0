// lib.rs - SQL 映射持久层
//
// 调用方通过 `SqlSessionFactory` 打开会话，按 `namespace.id` 执行预先注册的参数化 SQL，
// 结果映射为已注册的 serde 类型。查询结果经过两级缓存：
// - 一级缓存：会话级，提交或回滚时清空
// - 二级缓存：命名空间级，跨会话共享，会话提交后才可见

pub mod binding; // mapper 接口与代理分发
pub mod core; // 日志等基础设施
pub mod data; // 数据源、错误类型与缓存
pub mod executor; // 语句执行器
pub mod models; // 配置与语句元数据
pub mod session; // 会话与会话工厂
pub mod types; // 类型注册与结果列表
pub mod utils; // SQL 模板解析等工具

pub use binding::{Mapper, MapperProxy, MapperResult, MethodSignature, ReturnKind};
pub use crate::core::{init_logger, update_log_level};
pub use data::{DataSource, PersistenceError, Result, SqliteDataSource};
pub use models::{
    BoundSql, DataSourceConfig, LogConfig, LogFormat, LogLevel, LogOutput, MappedStatement,
    PersistenceConfig, SqlCommandType, StatementDef,
};
pub use session::{
    Configuration, DefaultSqlSession, Selected, SqlSession, SqlSessionFactory,
    SqlSessionFactoryBuilder,
};
pub use types::{ResultList, TypeRegistry};
