//! 全局配置注册表
//!
//! 启动阶段一次性写入数据源、类型、语句、缓存和 mapper 接口，之后以 `Arc<Configuration>`
//! 在所有会话之间只读共享。

use crate::binding::{Mapper, MapperProxyFactory};
use crate::data::cache::Cache;
use crate::data::{DataSource, PersistenceError, Result};
use crate::models::{MappedStatement, StatementDef};
use crate::types::{TypeDescriptor, TypeRegistry};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct Configuration {
    data_source: Arc<dyn DataSource>,
    mapped_statements: HashMap<String, Arc<MappedStatement>>,
    caches: HashMap<String, Arc<Cache>>,
    type_registry: TypeRegistry,
    known_mappers: HashMap<TypeId, MapperProxyFactory>,
}

impl Configuration {
    pub fn new(data_source: Arc<dyn DataSource>) -> Self {
        Self {
            data_source,
            mapped_statements: HashMap::new(),
            caches: HashMap::new(),
            type_registry: TypeRegistry::new(),
            known_mappers: HashMap::new(),
        }
    }

    pub fn data_source(&self) -> &Arc<dyn DataSource> {
        &self.data_source
    }

    /// 注册参数/结果类型
    pub fn register_type<T>(&mut self, alias: &str) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.type_registry.register::<T>(alias)
    }

    pub fn type_descriptor(&self, alias: &str) -> Result<Arc<TypeDescriptor>> {
        self.type_registry.resolve(alias)
    }

    /// 开始注册一个命名空间下的语句
    pub fn mapper(&mut self, namespace: impl Into<String>) -> MapperBuilder<'_> {
        MapperBuilder {
            configuration: self,
            namespace: namespace.into(),
            use_cache: false,
            statements: Vec::new(),
        }
    }

    /// 按全限定 ID（`namespace.id`）查找语句
    pub fn mapped_statement(&self, statement_id: &str) -> Result<Arc<MappedStatement>> {
        self.mapped_statements
            .get(statement_id)
            .cloned()
            .ok_or_else(|| PersistenceError::unknown_statement(statement_id))
    }

    pub fn has_statement(&self, statement_id: &str) -> bool {
        self.mapped_statements.contains_key(statement_id)
    }

    pub fn statement_ids(&self) -> impl Iterator<Item = &str> {
        self.mapped_statements.keys().map(String::as_str)
    }

    /// 按命名空间查找二级缓存
    pub fn cache(&self, id: &str) -> Option<Arc<Cache>> {
        self.caches.get(id).cloned()
    }

    /// 注册 mapper 接口
    ///
    /// 接口的每个方法都必须已有同名语句，因此应在对应命名空间的语句注册之后调用。
    pub fn add_mapper<M: Mapper>(&mut self) -> Result<()> {
        let type_id = TypeId::of::<M>();
        if self.known_mappers.contains_key(&type_id) {
            return Err(PersistenceError::configuration(format!(
                "mapper 接口重复注册: {}",
                type_name::<M>()
            )));
        }

        let factory = MapperProxyFactory::new::<M>(self)?;
        tracing::debug!(
            namespace = M::NAMESPACE,
            methods = M::METHODS.len(),
            "注册 mapper 接口"
        );
        self.known_mappers.insert(type_id, factory);
        Ok(())
    }

    pub fn has_mapper<M: Mapper>(&self) -> bool {
        self.known_mappers.contains_key(&TypeId::of::<M>())
    }

    pub fn mapper_factory<M: Mapper>(&self) -> Result<&MapperProxyFactory> {
        self.known_mappers.get(&TypeId::of::<M>()).ok_or_else(|| {
            PersistenceError::configuration(format!(
                "mapper 接口未注册: {} ({})",
                type_name::<M>(),
                M::NAMESPACE
            ))
        })
    }
}

/// 命名空间级的语句注册器
///
/// `build` 之前不会修改配置；任何一条语句校验失败时整个命名空间都不会注册。
pub struct MapperBuilder<'a> {
    configuration: &'a mut Configuration,
    namespace: String,
    use_cache: bool,
    statements: Vec<StatementDef>,
}

impl<'a> MapperBuilder<'a> {
    /// 为该命名空间启用二级缓存
    pub fn cache(mut self) -> Self {
        self.use_cache = true;
        self
    }

    pub fn statement(mut self, def: StatementDef) -> Self {
        self.statements.push(def);
        self
    }

    pub fn statements(mut self, defs: impl IntoIterator<Item = StatementDef>) -> Self {
        self.statements.extend(defs);
        self
    }

    pub fn build(self) -> Result<()> {
        let MapperBuilder {
            configuration,
            namespace,
            use_cache,
            statements,
        } = self;

        if use_cache && configuration.caches.contains_key(&namespace) {
            return Err(PersistenceError::configuration(format!(
                "缓存 {} 重复注册",
                namespace
            )));
        }
        let cache = use_cache.then(|| Arc::new(Cache::new(namespace.clone())));

        let mut mapped = Vec::with_capacity(statements.len());
        for def in statements {
            let statement = MappedStatement::from_def(&namespace, def, cache.clone())?;
            let duplicate = configuration.mapped_statements.contains_key(statement.id())
                || mapped.iter().any(|m: &MappedStatement| m.id() == statement.id());
            if duplicate {
                return Err(PersistenceError::configuration(format!(
                    "语句 ID 重复: {}",
                    statement.id()
                )));
            }
            mapped.push(statement);
        }

        tracing::debug!(
            namespace = %namespace,
            statements = mapped.len(),
            cache = use_cache,
            "注册 mapper 语句"
        );

        if let Some(cache) = cache {
            configuration.caches.insert(namespace, cache);
        }
        for statement in mapped {
            configuration
                .mapped_statements
                .insert(statement.id().to_string(), Arc::new(statement));
        }
        Ok(())
    }
}
