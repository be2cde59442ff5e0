//! 参数/结果类型注册
//!
//! 以类型名（如 `model.Person`）注册 serde 类型，注册时探测一次成员列表并缓存：
//! - 参数绑定时校验命名成员是否存在
//! - 结果映射时校验每一列都有同名可写成员
//!
//! 查询结果以类型擦除的 `ResultList` 在执行器和缓存之间流转，由会话层还原为具体类型。

pub mod value;

use crate::data::{PersistenceError, Result};
use crate::utils::introspect::struct_members;
use self::value::RowDeserializer;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 一次查询物化后的结果列表
///
/// 内部持有 `Arc<Vec<T>>`，克隆只增加引用计数，一级/二级缓存命中时返回同一份列表。
#[derive(Clone)]
pub struct ResultList {
    rows: Arc<dyn Any + Send + Sync>,
    len: usize,
    element_type: &'static str,
}

impl ResultList {
    pub fn new<T: Send + Sync + 'static>(rows: Vec<T>) -> Self {
        Self {
            len: rows.len(),
            rows: Arc::new(rows),
            element_type: type_name::<T>(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 元素的 Rust 类型名
    pub fn element_type(&self) -> &'static str {
        self.element_type
    }

    /// 还原为具体类型的列表
    ///
    /// 元素类型与请求类型不一致时返回配置错误。
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Result<Arc<Vec<T>>> {
        Arc::clone(&self.rows).downcast::<Vec<T>>().map_err(|_| {
            PersistenceError::configuration(format!(
                "结果类型不匹配: 语句返回 {}，调用方期望 {}",
                self.element_type,
                type_name::<T>()
            ))
        })
    }

    /// 两个结果列表是否指向同一份数据
    pub fn ptr_eq(&self, other: &ResultList) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }
}

impl fmt::Debug for ResultList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultList")
            .field("element_type", &self.element_type)
            .field("len", &self.len)
            .finish()
    }
}

type Materializer = fn(&TypeDescriptor, Vec<Map<String, JsonValue>>) -> Result<ResultList>;

/// 已注册类型的元数据
pub struct TypeDescriptor {
    alias: String,
    rust_type: &'static str,
    members: &'static [&'static str],
    materializer: Materializer,
}

impl TypeDescriptor {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn members(&self) -> &'static [&'static str] {
        self.members
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains(&name)
    }

    /// 将结果行物化为该类型的列表
    ///
    /// 调用前应已通过 [`TypeDescriptor::has_member`] 校验过列名。
    pub fn materialize(&self, rows: Vec<Map<String, JsonValue>>) -> Result<ResultList> {
        (self.materializer)(self, rows)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("alias", &self.alias)
            .field("rust_type", &self.rust_type)
            .field("members", &self.members)
            .finish()
    }
}

fn materialize_rows<T>(
    descriptor: &TypeDescriptor,
    rows: Vec<Map<String, JsonValue>>,
) -> Result<ResultList>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        let item = T::deserialize(RowDeserializer::new(row)).map_err(|e| {
            PersistenceError::binding(format!(
                "无法将结果行映射为 {}: {}",
                descriptor.alias, e
            ))
        })?;
        results.push(item);
    }
    Ok(ResultList::new(results))
}

/// 类型名到类型元数据的注册表
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<TypeDescriptor>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册类型
    ///
    /// # 参数
    ///
    /// - `alias`: 语句中引用的类型名，全局唯一
    ///
    /// # 错误
    ///
    /// 类型名重复，或类型不是具名字段的结构体时返回配置错误。
    pub fn register<T>(&mut self, alias: &str) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        if self.types.contains_key(alias) {
            return Err(PersistenceError::configuration(format!(
                "类型名重复注册: {}",
                alias
            )));
        }

        let members = struct_members::<T>().ok_or_else(|| {
            PersistenceError::configuration(format!(
                "类型 {} ({}) 不是具名字段的结构体",
                alias,
                type_name::<T>()
            ))
        })?;

        tracing::debug!(alias, rust_type = type_name::<T>(), ?members, "注册类型");

        self.types.insert(
            alias.to_string(),
            Arc::new(TypeDescriptor {
                alias: alias.to_string(),
                rust_type: type_name::<T>(),
                members,
                materializer: materialize_rows::<T>,
            }),
        );
        Ok(())
    }

    /// 按类型名解析类型元数据
    pub fn resolve(&self, alias: &str) -> Result<Arc<TypeDescriptor>> {
        self.types
            .get(alias)
            .cloned()
            .ok_or_else(|| PersistenceError::configuration(format!("无法解析类型名: {}", alias)))
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.types.contains_key(alias)
    }
}
