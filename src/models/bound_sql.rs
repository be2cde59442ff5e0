//! 解析后的 SQL
//!
//! `BoundSql` 每次执行生成一次，不跨调用缓存。

use serde::{Deserialize, Serialize};

/// SQL 模板中的一个参数占位
///
/// 顺序与改写后 SQL 中 `?` 的顺序一一对应。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMapping {
    /// 参数名（占位符 `#{...}` 中去掉首尾空白的内容）
    pub content: String,
}

impl ParameterMapping {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundSql {
    /// 改写后的 SQL（占位符已替换为 `?`）
    pub sql: String,
    /// 按位置排列的参数映射
    pub parameter_mappings: Vec<ParameterMapping>,
}

impl BoundSql {
    pub fn new(sql: String, parameter_mappings: Vec<ParameterMapping>) -> Self {
        Self {
            sql,
            parameter_mappings,
        }
    }

    /// 参数名列表（按位置）
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameter_mappings
            .iter()
            .map(|mapping| mapping.content.as_str())
            .collect()
    }
}
