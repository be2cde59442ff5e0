pub mod bound_sql;
pub mod config;
pub mod statement;

pub use bound_sql::{BoundSql, ParameterMapping};
pub use config::{DataSourceConfig, LogConfig, LogFormat, LogLevel, LogOutput, PersistenceConfig};
pub use statement::{MappedStatement, SqlCommandType, StatementDef};
