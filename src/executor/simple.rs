//! 直接访问数据源的执行器
//!
//! 查询结果先进入会话级一级缓存，同一会话内相同语句 + 相同参数的查询不再访问数据库。
//! 一级缓存只在 `commit`/`rollback` 时清空。

use crate::data::cache::{Cache, CacheKey};
use crate::data::{PersistenceError, Result};
use crate::executor::parameter::bind_parameters;
use crate::executor::Executor;
use crate::models::{BoundSql, MappedStatement};
use crate::session::Configuration;
use crate::types::value::sql_to_json;
use crate::types::{ResultList, TypeDescriptor};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

const LOCAL_CACHE_ID: &str = "local";

pub struct SimpleExecutor {
    configuration: Arc<Configuration>,
    local_cache: Cache,
}

impl SimpleExecutor {
    pub fn new(configuration: Arc<Configuration>) -> Self {
        Self {
            configuration,
            local_cache: Cache::new(LOCAL_CACHE_ID),
        }
    }

    /// 一级缓存
    pub fn local_cache(&self) -> &Cache {
        &self.local_cache
    }

    fn prepare(
        &self,
        statement: &MappedStatement,
        param: Option<&JsonValue>,
    ) -> Result<(BoundSql, Vec<SqlValue>)> {
        let bound_sql = statement.bound_sql();
        let values = bind_parameters(&self.configuration, statement, &bound_sql, param)?;
        Ok((bound_sql, values))
    }
}

/// 执行查询并把每一行转换为 `列名 -> 值` 的记录
///
/// 列名必须全部能在结果类型上找到同名成员，否则在读取任何行之前返回绑定错误。
fn query_records(
    conn: &Connection,
    statement_id: &str,
    bound_sql: &BoundSql,
    values: &[SqlValue],
    descriptor: &TypeDescriptor,
) -> Result<Vec<Map<String, JsonValue>>> {
    let mut stmt = conn.prepare(&bound_sql.sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    if let Some(column) = columns.iter().find(|c| !descriptor.has_member(c)) {
        return Err(PersistenceError::binding(format!(
            "语句 {} 的结果列 `{}` 在类型 {} 上没有对应成员，可用成员: {:?}",
            statement_id,
            column,
            descriptor.alias(),
            descriptor.members()
        )));
    }

    let mut rows = stmt.query(params_from_iter(values.iter()))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Map::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            record.insert(column.clone(), sql_to_json(row.get_ref(index)?));
        }
        records.push(record);
    }
    Ok(records)
}

impl Executor for SimpleExecutor {
    fn select(&mut self, statement_id: &str, param: Option<&JsonValue>) -> Result<ResultList> {
        let key = CacheKey::new(statement_id, param);
        if let Some(list) = self.local_cache.get(&key) {
            tracing::debug!(key = %key, rows = list.len(), "一级缓存命中");
            return Ok(list);
        }

        let statement = self.configuration.mapped_statement(statement_id)?;
        let result_type = statement.result_type().ok_or_else(|| {
            PersistenceError::configuration(format!("查询语句 {} 未声明结果类型", statement_id))
        })?;
        let descriptor = self.configuration.type_descriptor(result_type)?;
        let (bound_sql, values) = self.prepare(&statement, param)?;

        tracing::debug!(statement_id, sql = %bound_sql.sql, "执行查询");

        let records = {
            let conn = self.configuration.data_source().get_connection()?;
            query_records(&conn, statement_id, &bound_sql, &values, &descriptor)?
        };
        let list = descriptor.materialize(records)?;
        tracing::debug!(
            statement_id,
            rows = list.len(),
            element_type = list.element_type(),
            "查询结果已映射"
        );

        self.local_cache.put(key, list.clone());
        Ok(list)
    }

    fn update(&mut self, statement_id: &str, param: Option<&JsonValue>) -> Result<usize> {
        let statement = self.configuration.mapped_statement(statement_id)?;
        let (bound_sql, values) = self.prepare(&statement, param)?;

        tracing::debug!(
            statement_id,
            kind = %statement.sql_command_type(),
            sql = %bound_sql.sql,
            "执行写语句"
        );

        let conn = self.configuration.data_source().get_connection()?;
        let affected = conn.execute(&bound_sql.sql, params_from_iter(values.iter()))?;
        Ok(affected)
    }

    fn commit(&mut self) {
        self.local_cache.clear();
    }

    fn rollback(&mut self) {
        self.local_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datasource::testing::{CountingDataSource, UnavailableDataSource};
    use crate::models::StatementDef;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Person {
        id: i64,
        name: String,
        age: i64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct NameOnly {
        name: String,
    }

    const DDL: &str = "
        CREATE TABLE person (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER NOT NULL);
        INSERT INTO person VALUES (1, '张三', 30), (2, '李四', 25);
    ";

    fn setup() -> (Arc<CountingDataSource>, Arc<Configuration>) {
        let data_source = Arc::new(CountingDataSource::new(DDL));
        let mut configuration = Configuration::new(data_source.clone());
        configuration.register_type::<Person>("model.Person").unwrap();
        configuration.register_type::<NameOnly>("model.NameOnly").unwrap();
        configuration
            .mapper("mapper.PersonMapper")
            .statement(
                StatementDef::select("selectById", "select * from person where id = #{id}")
                    .parameter_type("model.Person")
                    .result_type("model.Person"),
            )
            .statement(
                StatementDef::select("selectNames", "select id, name from person")
                    .result_type("model.NameOnly"),
            )
            .statement(StatementDef::select("selectUntyped", "select * from person"))
            .statement(
                StatementDef::select("selectUnregistered", "select * from person")
                    .result_type("model.Missing"),
            )
            .statement(
                StatementDef::update("rename", "update person set name = #{name} where id = #{id}")
                    .parameter_type("model.Person"),
            )
            .build()
            .unwrap();
        (data_source, Arc::new(configuration))
    }

    fn person(list: &ResultList) -> Person {
        list.downcast::<Person>().unwrap()[0].clone()
    }

    #[test]
    fn test_select_maps_every_column() {
        let (_, configuration) = setup();
        let mut executor = SimpleExecutor::new(configuration);

        let list = executor
            .select("mapper.PersonMapper.selectById", Some(&json!({"id": 1})))
            .unwrap();
        assert_eq!(
            person(&list),
            Person {
                id: 1,
                name: "张三".to_string(),
                age: 30,
            }
        );
    }

    #[test]
    fn test_local_cache_hit_skips_data_source() {
        let (data_source, configuration) = setup();
        let mut executor = SimpleExecutor::new(configuration);
        let param = json!({"id": 1});

        let first = executor.select("mapper.PersonMapper.selectById", Some(&param)).unwrap();
        let second = executor.select("mapper.PersonMapper.selectById", Some(&param)).unwrap();

        assert_eq!(data_source.round_trips(), 1);
        assert!(first.ptr_eq(&second));
        assert_eq!(executor.local_cache().len(), 1);
    }

    #[test]
    fn test_different_params_are_different_entries() {
        let (data_source, configuration) = setup();
        let mut executor = SimpleExecutor::new(configuration);

        let first = executor
            .select("mapper.PersonMapper.selectById", Some(&json!({"id": 1})))
            .unwrap();
        let second = executor
            .select("mapper.PersonMapper.selectById", Some(&json!({"id": 2})))
            .unwrap();

        assert_eq!(data_source.round_trips(), 2);
        assert_eq!(person(&first).name, "张三");
        assert_eq!(person(&second).name, "李四");
    }

    #[test]
    fn test_commit_clears_local_cache() {
        let (data_source, configuration) = setup();
        let mut executor = SimpleExecutor::new(configuration);
        let param = json!({"id": 1});

        executor.select("mapper.PersonMapper.selectById", Some(&param)).unwrap();
        executor.commit();
        assert!(executor.local_cache().is_empty());

        executor.select("mapper.PersonMapper.selectById", Some(&param)).unwrap();
        assert_eq!(data_source.round_trips(), 2);
    }

    #[test]
    fn test_update_does_not_clear_local_cache() {
        let (_, configuration) = setup();
        let mut executor = SimpleExecutor::new(configuration);
        let param = json!({"id": 1, "name": "王五", "age": 30});

        let before = executor.select("mapper.PersonMapper.selectById", Some(&param)).unwrap();
        let affected = executor.update("mapper.PersonMapper.rename", Some(&param)).unwrap();
        assert_eq!(affected, 1);

        // 写操作不失效缓存，同一会话内仍读到旧值
        let after = executor.select("mapper.PersonMapper.selectById", Some(&param)).unwrap();
        assert!(before.ptr_eq(&after));
        assert_eq!(person(&after).name, "张三");
    }

    #[test]
    fn test_column_without_member_is_binding_error() {
        let (_, configuration) = setup();
        let mut executor = SimpleExecutor::new(configuration);

        let err = executor.select("mapper.PersonMapper.selectNames", None).unwrap_err();
        assert!(matches!(err, PersistenceError::Binding(_)));
        assert!(err.to_string().contains("`id`"));
    }

    #[test]
    fn test_select_without_result_type() {
        let (_, configuration) = setup();
        let mut executor = SimpleExecutor::new(configuration);

        let err = executor.select("mapper.PersonMapper.selectUntyped", None).unwrap_err();
        assert!(matches!(err, PersistenceError::Configuration(_)));
    }

    #[test]
    fn test_unregistered_result_type_fails_before_connecting() {
        let (data_source, configuration) = setup();
        let mut executor = SimpleExecutor::new(configuration);

        let err = executor
            .select("mapper.PersonMapper.selectUnregistered", None)
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Configuration(_)));
        assert!(err.to_string().contains("model.Missing"));
        assert_eq!(data_source.round_trips(), 0);
        assert!(executor.local_cache().is_empty());
    }

    #[test]
    fn test_unknown_statement() {
        let (data_source, configuration) = setup();
        let mut executor = SimpleExecutor::new(configuration);

        let err = executor.select("mapper.PersonMapper.missing", None).unwrap_err();
        assert!(matches!(err, PersistenceError::Configuration(_)));
        assert!(executor.update("mapper.PersonMapper.missing", None).is_err());
        assert_eq!(data_source.round_trips(), 0);
    }

    #[test]
    fn test_update_rejects_missing_param() {
        let (data_source, configuration) = setup();
        let mut executor = SimpleExecutor::new(configuration);

        let err = executor.update("mapper.PersonMapper.rename", None).unwrap_err();
        assert!(matches!(err, PersistenceError::Binding(_)));
        assert_eq!(data_source.round_trips(), 0);
    }

    #[test]
    fn test_connection_failure_surfaces() {
        let mut configuration = Configuration::new(Arc::new(UnavailableDataSource));
        configuration.register_type::<Person>("model.Person").unwrap();
        configuration
            .mapper("mapper.PersonMapper")
            .statement(StatementDef::select("all", "select * from person").result_type("model.Person"))
            .build()
            .unwrap();
        let mut executor = SimpleExecutor::new(Arc::new(configuration));

        let err = executor.select("mapper.PersonMapper.all", None).unwrap_err();
        assert!(matches!(err, PersistenceError::Connection(_)));
        assert!(executor.local_cache().is_empty());
    }
}
