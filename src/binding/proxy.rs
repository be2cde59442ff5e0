//! Mapper 代理
//!
//! `MapperProxyFactory` 在注册时生成调度表，`MapperProxy` 借用会话并按方法名分发到
//! `select_one` / `select_list` / `insert` / `update` / `delete`。

use crate::binding::{Mapper, ReturnKind};
use crate::data::{PersistenceError, Result};
use crate::models::SqlCommandType;
use crate::session::{Configuration, SqlSession};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// 调度表中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperMethod {
    pub statement_id: String,
    pub command: SqlCommandType,
    pub returns: ReturnKind,
}

/// 一次代理调用的结果
#[derive(Debug, Clone, PartialEq)]
pub enum MapperResult<T> {
    One(Option<T>),
    List(Vec<T>),
    RowCount(usize),
}

/// mapper 代理工厂，每个已注册的 mapper 接口一个
#[derive(Debug, Clone)]
pub struct MapperProxyFactory {
    namespace: &'static str,
    methods: Arc<HashMap<&'static str, MapperMethod>>,
}

impl MapperProxyFactory {
    /// 为 mapper 接口生成调度表
    ///
    /// # 错误
    ///
    /// - 方法名重复
    /// - 方法对应的语句未注册
    /// - 返回形态与语句类型不匹配（查询必须返回 `One`/`List`，写语句必须返回 `RowCount`）
    pub fn new<M: Mapper>(configuration: &Configuration) -> Result<Self> {
        let mut methods = HashMap::with_capacity(M::METHODS.len());

        for signature in M::METHODS {
            let statement_id = format!("{}.{}", M::NAMESPACE, signature.name);
            let statement = configuration.mapped_statement(&statement_id)?;
            let command = statement.sql_command_type();

            let compatible = matches!(
                (command, signature.returns),
                (SqlCommandType::Select, ReturnKind::One | ReturnKind::List)
                    | (
                        SqlCommandType::Insert | SqlCommandType::Update | SqlCommandType::Delete,
                        ReturnKind::RowCount
                    )
            );
            if !compatible {
                return Err(PersistenceError::configuration(format!(
                    "mapper 方法 {} 的返回形态 {:?} 与语句类型 {} 不匹配",
                    statement_id, signature.returns, command
                )));
            }

            let method = MapperMethod {
                statement_id,
                command,
                returns: signature.returns,
            };
            if methods.insert(signature.name, method).is_some() {
                return Err(PersistenceError::configuration(format!(
                    "mapper {} 的方法 {} 重复声明",
                    M::NAMESPACE,
                    signature.name
                )));
            }
        }

        Ok(Self {
            namespace: M::NAMESPACE,
            methods: Arc::new(methods),
        })
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn method(&self, name: &str) -> Option<&MapperMethod> {
        self.methods.get(name)
    }

    /// 绑定到会话，生成代理
    pub fn new_instance<'s, S: SqlSession>(&self, session: &'s mut S) -> MapperProxy<'s, S> {
        MapperProxy {
            session,
            namespace: self.namespace,
            methods: Arc::clone(&self.methods),
        }
    }
}

/// 绑定到会话的 mapper 代理
pub struct MapperProxy<'s, S> {
    session: &'s mut S,
    namespace: &'static str,
    methods: Arc<HashMap<&'static str, MapperMethod>>,
}

impl<'s, S: SqlSession> MapperProxy<'s, S> {
    fn method(&self, name: &str) -> Result<MapperMethod> {
        self.methods.get(name).cloned().ok_or_else(|| {
            PersistenceError::configuration(format!(
                "mapper {} 没有方法 {}",
                self.namespace, name
            ))
        })
    }

    /// 按方法名分发调用
    ///
    /// # 参数
    ///
    /// - `name`: 方法名
    /// - `param`: 参数对象，无参数时传 `&()`
    pub fn invoke<T, P>(&mut self, name: &str, param: &P) -> Result<MapperResult<T>>
    where
        T: Clone + Send + Sync + 'static,
        P: Serialize,
    {
        let method = self.method(name)?;
        tracing::trace!(statement_id = %method.statement_id, "mapper 调用");

        let result = match method.command {
            SqlCommandType::Select => match method.returns {
                ReturnKind::List => {
                    MapperResult::List(self.session.select_list(&method.statement_id, param)?)
                }
                _ => MapperResult::One(self.session.select_one(&method.statement_id, param)?),
            },
            SqlCommandType::Insert => {
                MapperResult::RowCount(self.session.insert(&method.statement_id, param)?)
            }
            SqlCommandType::Update => {
                MapperResult::RowCount(self.session.update(&method.statement_id, param)?)
            }
            SqlCommandType::Delete => {
                MapperResult::RowCount(self.session.delete(&method.statement_id, param)?)
            }
        };
        Ok(result)
    }

    /// 调用返回单个对象的方法
    pub fn fetch_one<T, P>(&mut self, name: &str, param: &P) -> Result<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
        P: Serialize,
    {
        let method = self.method_with_shape(name, ReturnKind::One)?;
        self.session.select_one(&method.statement_id, param)
    }

    /// 调用返回列表的方法
    pub fn fetch_list<T, P>(&mut self, name: &str, param: &P) -> Result<Vec<T>>
    where
        T: Clone + Send + Sync + 'static,
        P: Serialize,
    {
        let method = self.method_with_shape(name, ReturnKind::List)?;
        self.session.select_list(&method.statement_id, param)
    }

    /// 调用写方法，返回影响行数
    pub fn execute<P: Serialize>(&mut self, name: &str, param: &P) -> Result<usize> {
        self.method_with_shape(name, ReturnKind::RowCount)?;
        match self.invoke::<(), P>(name, param)? {
            MapperResult::RowCount(affected) => Ok(affected),
            _ => Err(self.shape_mismatch(name, ReturnKind::RowCount)),
        }
    }

    /// 代理背后的会话
    pub fn session(&mut self) -> &mut S {
        &mut *self.session
    }

    fn method_with_shape(&self, name: &str, expected: ReturnKind) -> Result<MapperMethod> {
        let method = self.method(name)?;
        if method.returns != expected {
            return Err(self.shape_mismatch(name, expected));
        }
        Ok(method)
    }

    fn shape_mismatch(&self, name: &str, expected: ReturnKind) -> PersistenceError {
        PersistenceError::configuration(format!(
            "mapper {} 的方法 {} 不是 {:?} 形态",
            self.namespace, name, expected
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datasource::testing::CountingDataSource;
    use crate::models::StatementDef;
    use crate::session::SqlSessionFactory;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Person {
        id: i64,
        name: String,
    }

    #[derive(Serialize)]
    struct ById {
        id: i64,
    }

    crate::mapper_interface!(PersonMapper = "mapper.PersonMapper" {
        selectOne => One,
        findAll => List,
        insertPerson => RowCount,
        deletePerson => RowCount,
    });

    crate::mapper_interface!(WrongShapeMapper = "mapper.PersonMapper" {
        findAll => RowCount,
    });

    crate::mapper_interface!(MissingStatementMapper = "mapper.PersonMapper" {
        selectByName => One,
    });

    crate::mapper_interface!(DuplicateMethodMapper = "mapper.PersonMapper" {
        selectOne => One,
        selectOne => List,
    });

    /// 调用方自己定义的强类型接口
    trait PersonDao {
        fn select_one(&mut self, id: i64) -> Result<Option<Person>>;
        fn find_all(&mut self) -> Result<Vec<Person>>;
        fn insert_person(&mut self, person: &Person) -> Result<usize>;
    }

    impl<S: SqlSession> PersonDao for MapperProxy<'_, S> {
        fn select_one(&mut self, id: i64) -> Result<Option<Person>> {
            self.fetch_one("selectOne", &ById { id })
        }

        fn find_all(&mut self) -> Result<Vec<Person>> {
            self.fetch_list("findAll", &())
        }

        fn insert_person(&mut self, person: &Person) -> Result<usize> {
            self.execute("insertPerson", person)
        }
    }

    fn configuration() -> Configuration {
        let data_source = CountingDataSource::new(
            "CREATE TABLE person (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
             INSERT INTO person VALUES (1, '张三');",
        );
        let mut configuration = Configuration::new(std::sync::Arc::new(data_source));
        configuration.register_type::<Person>("model.Person").unwrap();
        configuration
            .mapper("mapper.PersonMapper")
            .statement(
                StatementDef::select("selectOne", "select * from person where id = #{id}")
                    .result_type("model.Person"),
            )
            .statement(
                StatementDef::select("findAll", "select * from person order by id")
                    .result_type("model.Person"),
            )
            .statement(
                StatementDef::insert("insertPerson", "insert into person (id, name) values (#{id}, #{name})")
                    .parameter_type("model.Person"),
            )
            .statement(StatementDef::delete("deletePerson", "delete from person where id = #{id}"))
            .build()
            .unwrap();
        configuration
    }

    #[test]
    fn test_dispatch_table() {
        let configuration = configuration();
        let factory = MapperProxyFactory::new::<PersonMapper>(&configuration).unwrap();

        assert_eq!(factory.namespace(), "mapper.PersonMapper");
        let method = factory.method("deletePerson").unwrap();
        assert_eq!(method.statement_id, "mapper.PersonMapper.deletePerson");
        assert_eq!(method.command, SqlCommandType::Delete);
        assert_eq!(method.returns, ReturnKind::RowCount);
        assert!(factory.method("selectByName").is_none());
    }

    #[test]
    fn test_registration_errors() {
        let configuration = configuration();

        let err = MapperProxyFactory::new::<WrongShapeMapper>(&configuration).unwrap_err();
        assert!(matches!(err, PersistenceError::Configuration(_)));

        let err = MapperProxyFactory::new::<MissingStatementMapper>(&configuration).unwrap_err();
        assert!(err.to_string().contains("mapper.PersonMapper.selectByName"));

        let err = MapperProxyFactory::new::<DuplicateMethodMapper>(&configuration).unwrap_err();
        assert!(matches!(err, PersistenceError::Configuration(_)));
    }

    #[test]
    fn test_add_mapper_twice() {
        let mut configuration = configuration();
        configuration.add_mapper::<PersonMapper>().unwrap();
        assert!(configuration.has_mapper::<PersonMapper>());
        assert!(configuration.add_mapper::<PersonMapper>().is_err());
    }

    #[test]
    fn test_proxy_through_session() {
        let mut configuration = configuration();
        configuration.add_mapper::<PersonMapper>().unwrap();
        let factory = SqlSessionFactory::new(configuration);
        let mut session = factory.open_session();

        let mut mapper = session.get_mapper::<PersonMapper>().unwrap();
        assert_eq!(
            mapper
                .insert_person(&Person {
                    id: 2,
                    name: "李四".to_string(),
                })
                .unwrap(),
            1
        );
        assert_eq!(mapper.select_one(1).unwrap().unwrap().name, "张三");
        assert_eq!(mapper.select_one(9).unwrap(), None);
        assert_eq!(mapper.find_all().unwrap().len(), 2);

        let deleted = mapper.invoke::<Person, _>("deletePerson", &ById { id: 2 }).unwrap();
        assert_eq!(deleted, MapperResult::RowCount(1));

        mapper.session().commit();
    }

    #[test]
    fn test_proxy_rejects_unknown_method_and_wrong_shape() {
        let mut configuration = configuration();
        configuration.add_mapper::<PersonMapper>().unwrap();
        let factory = SqlSessionFactory::new(configuration);
        let mut session = factory.open_session();
        let mut mapper = session.get_mapper::<PersonMapper>().unwrap();

        let err = mapper.invoke::<Person, _>("toString", &()).unwrap_err();
        assert!(matches!(err, PersistenceError::Configuration(_)));

        let err = mapper.fetch_list::<Person, _>("selectOne", &ById { id: 1 }).unwrap_err();
        assert!(matches!(err, PersistenceError::Configuration(_)));
    }

    #[test]
    fn test_unregistered_mapper() {
        let factory = SqlSessionFactory::new(configuration());
        let mut session = factory.open_session();
        assert!(session.get_mapper::<PersonMapper>().is_err());
    }
}
