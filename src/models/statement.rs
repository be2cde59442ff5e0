//! 语句元数据
//!
//! `StatementDef` 是外部 mapper 解析器交给注册表的声明（对应 mapper 文件里的一个
//! `<select>`/`<insert>`/`<update>`/`<delete>` 元素），注册后成为不可变的 `MappedStatement`。

use crate::data::cache::Cache;
use crate::data::{PersistenceError, Result};
use crate::models::bound_sql::BoundSql;
use crate::utils::token_parser::bind_sql;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// 语句类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlCommandType {
    Select,
    Insert,
    Update,
    Delete,
}

impl SqlCommandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlCommandType::Select => "select",
            SqlCommandType::Insert => "insert",
            SqlCommandType::Update => "update",
            SqlCommandType::Delete => "delete",
        }
    }
}

impl FromStr for SqlCommandType {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "select" => Ok(SqlCommandType::Select),
            "insert" => Ok(SqlCommandType::Insert),
            "update" => Ok(SqlCommandType::Update),
            "delete" => Ok(SqlCommandType::Delete),
            _ => Err(PersistenceError::configuration(format!(
                "未知的语句类型: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for SqlCommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 语句声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementDef {
    /// 语句类型标签：select / insert / update / delete
    pub kind: String,
    /// 命名空间内的语句 ID
    pub id: String,
    /// 原始 SQL 模板
    pub sql: String,
    #[serde(default)]
    pub parameter_type: Option<String>,
    #[serde(default)]
    pub result_type: Option<String>,
}

impl StatementDef {
    pub fn new(kind: impl Into<String>, id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            sql: sql.into(),
            parameter_type: None,
            result_type: None,
        }
    }

    pub fn select(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::new("select", id, sql)
    }

    pub fn insert(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::new("insert", id, sql)
    }

    pub fn update(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::new("update", id, sql)
    }

    pub fn delete(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::new("delete", id, sql)
    }

    pub fn parameter_type(mut self, alias: impl Into<String>) -> Self {
        self.parameter_type = Some(alias.into());
        self
    }

    pub fn result_type(mut self, alias: impl Into<String>) -> Self {
        self.result_type = Some(alias.into());
        self
    }
}

/// 已注册的语句
#[derive(Debug, Clone)]
pub struct MappedStatement {
    id: String,
    sql_command_type: SqlCommandType,
    sql: String,
    parameter_type: Option<String>,
    result_type: Option<String>,
    cache: Option<Arc<Cache>>,
}

impl MappedStatement {
    /// 由声明生成语句，`id` 为 `namespace.id`
    pub fn from_def(namespace: &str, def: StatementDef, cache: Option<Arc<Cache>>) -> Result<Self> {
        let sql_command_type = def.kind.parse::<SqlCommandType>()?;
        let sql = def.sql.trim().to_string();

        Ok(Self {
            id: format!("{}.{}", namespace, def.id),
            sql_command_type,
            sql,
            parameter_type: def.parameter_type,
            result_type: def.result_type,
            cache,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sql_command_type(&self) -> SqlCommandType {
        self.sql_command_type
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn parameter_type(&self) -> Option<&str> {
        self.parameter_type.as_deref()
    }

    pub fn result_type(&self) -> Option<&str> {
        self.result_type.as_deref()
    }

    /// 关联的二级缓存（未声明缓存的 mapper 为 `None`）
    pub fn cache(&self) -> Option<&Arc<Cache>> {
        self.cache.as_ref()
    }

    /// 改写 SQL 模板（每次执行调用一次）
    pub fn bound_sql(&self) -> BoundSql {
        bind_sql(&self.sql)
    }
}
