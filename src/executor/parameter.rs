//! 参数绑定
//!
//! 按 `ParameterMapping` 的顺序从参数对象中逐个取出命名成员，生成位置参数列表。
//! 每次调用只支持一个参数对象。

use crate::data::{PersistenceError, Result};
use crate::models::{BoundSql, MappedStatement};
use crate::session::Configuration;
use crate::types::value::json_to_sql;
use rusqlite::types::Value as SqlValue;
use serde_json::Value as JsonValue;

/// 为一次执行生成绑定值
///
/// # 参数
///
/// - `configuration`: 用于解析语句声明的参数类型
/// - `statement`: 当前语句
/// - `bound_sql`: 改写后的 SQL 与参数映射
/// - `param`: 序列化后的参数对象
///
/// # 错误
///
/// - 参数类型名无法解析：`Configuration`
/// - 缺少参数对象、参数不是对象、声明类型没有该成员或成员未被序列化：`Binding`
pub fn bind_parameters(
    configuration: &Configuration,
    statement: &MappedStatement,
    bound_sql: &BoundSql,
    param: Option<&JsonValue>,
) -> Result<Vec<SqlValue>> {
    if bound_sql.parameter_mappings.is_empty() {
        return Ok(Vec::new());
    }

    let declared = statement
        .parameter_type()
        .map(|alias| configuration.type_descriptor(alias))
        .transpose()?;

    let param = param.ok_or_else(|| {
        PersistenceError::binding(format!(
            "语句 {} 需要 {} 个参数，但调用时没有提供参数对象",
            statement.id(),
            bound_sql.parameter_mappings.len()
        ))
    })?;

    let fields = param.as_object().ok_or_else(|| {
        PersistenceError::binding(format!(
            "语句 {} 的参数必须是具名字段的结构体",
            statement.id()
        ))
    })?;

    let mut values = Vec::with_capacity(bound_sql.parameter_mappings.len());
    for mapping in &bound_sql.parameter_mappings {
        let name = mapping.content.as_str();

        if let Some(descriptor) = &declared {
            if !descriptor.has_member(name) {
                return Err(PersistenceError::binding(format!(
                    "参数类型 {} 没有成员 `{}`",
                    descriptor.alias(),
                    name
                )));
            }
        }

        let value = fields.get(name).ok_or_else(|| {
            PersistenceError::binding(format!(
                "语句 {} 的参数成员 `{}` 不存在或不可访问",
                statement.id(),
                name
            ))
        })?;
        values.push(json_to_sql(name, value)?);
    }

    tracing::debug!(statement_id = statement.id(), count = values.len(), "参数绑定完成");
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SqliteDataSource;
    use crate::models::StatementDef;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::Arc;

    #[allow(dead_code)]
    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Person {
        id: i64,
        name: String,
        #[serde(skip_serializing)]
        password: String,
    }

    fn configuration() -> Configuration {
        let data_source = Arc::new(SqliteDataSource::open_in_memory().unwrap());
        let mut configuration = Configuration::new(data_source);
        configuration.register_type::<Person>("model.Person").unwrap();
        configuration
    }

    fn statement(sql: &str, parameter_type: Option<&str>) -> MappedStatement {
        let mut def = StatementDef::select("s", sql).result_type("model.Person");
        if let Some(alias) = parameter_type {
            def = def.parameter_type(alias);
        }
        MappedStatement::from_def("mapper.PersonMapper", def, None).unwrap()
    }

    fn bind(sql: &str, parameter_type: Option<&str>, param: Option<JsonValue>) -> Result<Vec<SqlValue>> {
        let configuration = configuration();
        let ms = statement(sql, parameter_type);
        bind_parameters(&configuration, &ms, &ms.bound_sql(), param.as_ref())
    }

    #[test]
    fn test_values_follow_placeholder_order() {
        let values = bind(
            "select * from person where name = #{name} and id = #{id} or id = #{id}",
            Some("model.Person"),
            Some(json!({"id": 7, "name": "张三"})),
        )
        .unwrap();

        assert_eq!(
            values,
            vec![
                SqlValue::Text("张三".to_string()),
                SqlValue::Integer(7),
                SqlValue::Integer(7),
            ]
        );
    }

    #[test]
    fn test_no_placeholders_needs_no_param() {
        let values = bind("select * from person", Some("model.Person"), None).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_missing_param_object() {
        let err = bind("select * from person where id = #{id}", None, None).unwrap_err();
        assert!(matches!(err, PersistenceError::Binding(_)));
    }

    #[test]
    fn test_scalar_param_rejected() {
        let err = bind("select * from person where id = #{id}", None, Some(json!(1))).unwrap_err();
        assert!(matches!(err, PersistenceError::Binding(_)));
    }

    #[test]
    fn test_member_missing_on_declared_type() {
        let err = bind(
            "select * from person where age = #{age}",
            Some("model.Person"),
            Some(json!({"id": 1, "name": "张三", "age": 18})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("没有成员 `age`"));
    }

    #[test]
    fn test_member_not_serialized_is_inaccessible() {
        let err = bind(
            "select * from person where password = #{password}",
            Some("model.Person"),
            Some(json!({"id": 1, "name": "张三"})),
        )
        .unwrap_err();
        assert!(matches!(err, PersistenceError::Binding(_)));
    }

    #[test]
    fn test_unknown_parameter_type() {
        let err = bind(
            "select * from person where id = #{id}",
            Some("model.Missing"),
            Some(json!({"id": 1})),
        )
        .unwrap_err();
        assert!(matches!(err, PersistenceError::Configuration(_)));
    }

    #[test]
    fn test_undeclared_type_uses_serialized_members() {
        let values = bind(
            "select * from person where id = #{id}",
            None,
            Some(json!({"id": 3})),
        )
        .unwrap();
        assert_eq!(values, vec![SqlValue::Integer(3)]);
    }
}
