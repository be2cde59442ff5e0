//! 统一错误类型定义
//!
//! 使用 `thiserror` 定义持久层的所有错误类型。核心层不做任何本地恢复，
//! 所有错误都会中止当前调用并同步返回给调用方。

use std::path::PathBuf;
use thiserror::Error;

/// 持久层的统一错误类型
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// 配置错误：未知语句 ID、无法解析的类型名、无法识别的语句类型等
    #[error("配置错误: {0}")]
    Configuration(String),

    /// 绑定错误：参数对象缺少命名成员，或结果列找不到可写成员
    #[error("绑定错误: {0}")]
    Binding(String),

    /// 数据源连接错误（不重试，由调用方决定）
    #[error("数据源连接错误: {0}")]
    Connection(String),

    /// 单行查询返回了多行
    #[error("查询结果过多: 语句 {statement_id} 期望至多 1 行，实际返回 {rows} 行")]
    TooManyResults { statement_id: String, rows: usize },

    /// 语句执行期间的数据库错误（语法、约束等）
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    /// 文件 I/O 错误
    #[error("文件 I/O 错误: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML 反序列化错误
    #[error("TOML 反序列化错误: {0}")]
    TomlDeserialization(#[from] toml::de::Error),
}

/// 便于与现有代码集成的类型别名
pub type Result<T> = std::result::Result<T, PersistenceError>;

impl PersistenceError {
    /// 从 `std::io::Error` 和路径创建 I/O 错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn binding(msg: impl Into<String>) -> Self {
        Self::Binding(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// 未知语句 ID
    pub fn unknown_statement(statement_id: &str) -> Self {
        Self::Configuration(format!("未找到语句: {}", statement_id))
    }
}
