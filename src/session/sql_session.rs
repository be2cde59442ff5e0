//! 会话
//!
//! 会话是调用方使用的门面：序列化参数对象、交给执行器执行、把类型擦除的结果还原为
//! 调用方期望的类型。会话持有一级缓存和待提交的二级缓存条目，不应跨线程共享；
//! 未提交就丢弃的会话，其暂存的二级缓存条目随之丢弃。

use crate::binding::{Mapper, MapperProxy};
use crate::data::{PersistenceError, Result};
use crate::executor::{CachingExecutor, Executor, SimpleExecutor};
use crate::session::Configuration;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// 查询结果：单行模式返回 `One`，列表模式返回 `Many`
#[derive(Debug, Clone, PartialEq)]
pub enum Selected<T> {
    One(Option<T>),
    Many(Vec<T>),
}

impl<T> Selected<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Selected::One(value) => value,
            Selected::Many(rows) => rows.into_iter().next(),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Selected::One(value) => value.into_iter().collect(),
            Selected::Many(rows) => rows,
        }
    }
}

/// 会话接口
///
/// 参数对象可以是任意可序列化为具名字段的值；语句没有占位符时传 `&()`。
pub trait SqlSession {
    /// 执行查询
    ///
    /// # 参数
    ///
    /// - `statement_id`: 全限定语句 ID（`namespace.id`）
    /// - `is_list`: `true` 返回全部行；`false` 时 0 行返回 `None`、1 行返回该行，
    ///   多于 1 行返回 `TooManyResults`
    /// - `param`: 参数对象
    fn select<T>(
        &mut self,
        statement_id: &str,
        is_list: bool,
        param: &impl Serialize,
    ) -> Result<Selected<T>>
    where
        T: Clone + Send + Sync + 'static;

    fn update(&mut self, statement_id: &str, param: &impl Serialize) -> Result<usize>;

    fn insert(&mut self, statement_id: &str, param: &impl Serialize) -> Result<usize>;

    fn delete(&mut self, statement_id: &str, param: &impl Serialize) -> Result<usize>;

    /// 提交：清空一级缓存，并把暂存的查询结果刷入二级缓存
    fn commit(&mut self);

    /// 回滚：清空一级缓存，丢弃暂存的二级缓存条目
    fn rollback(&mut self);

    fn configuration(&self) -> &Arc<Configuration>;

    /// 获取绑定到本会话的 mapper 代理
    fn get_mapper<M: Mapper>(&mut self) -> Result<MapperProxy<'_, Self>>
    where
        Self: Sized,
    {
        let factory = self.configuration().mapper_factory::<M>()?.clone();
        Ok(factory.new_instance(self))
    }

    fn select_one<T>(&mut self, statement_id: &str, param: &impl Serialize) -> Result<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.select(statement_id, false, param).map(Selected::into_option)
    }

    fn select_list<T>(&mut self, statement_id: &str, param: &impl Serialize) -> Result<Vec<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.select(statement_id, true, param).map(Selected::into_vec)
    }
}

/// 序列化参数对象，`null`（含 `()`）视为没有参数
fn to_parameter(param: &impl Serialize) -> Result<Option<JsonValue>> {
    let value = serde_json::to_value(param)
        .map_err(|e| PersistenceError::binding(format!("参数对象无法序列化: {}", e)))?;
    Ok(match value {
        JsonValue::Null => None,
        value => Some(value),
    })
}

fn log_failure<T>(operation: &str, statement_id: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        tracing::warn!(operation, statement_id, error = %e, "语句执行失败");
    }
    result
}

/// 默认会话实现
pub struct DefaultSqlSession {
    configuration: Arc<Configuration>,
    executor: Box<dyn Executor>,
}

impl DefaultSqlSession {
    /// 使用 `CachingExecutor(SimpleExecutor)` 创建会话
    pub fn new(configuration: Arc<Configuration>) -> Self {
        let simple = SimpleExecutor::new(Arc::clone(&configuration));
        let executor = CachingExecutor::new(Box::new(simple), Arc::clone(&configuration));
        Self::with_executor(configuration, Box::new(executor))
    }

    pub fn with_executor(configuration: Arc<Configuration>, executor: Box<dyn Executor>) -> Self {
        Self {
            configuration,
            executor,
        }
    }
}

impl SqlSession for DefaultSqlSession {
    fn select<T>(
        &mut self,
        statement_id: &str,
        is_list: bool,
        param: &impl Serialize,
    ) -> Result<Selected<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let param = to_parameter(param)?;
        let list = log_failure(
            "select",
            statement_id,
            self.executor.select(statement_id, param.as_ref()),
        )?;
        let rows = list.downcast::<T>()?;

        if is_list {
            return Ok(Selected::Many(Vec::clone(&rows)));
        }
        match rows.len() {
            0 | 1 => Ok(Selected::One(rows.first().cloned())),
            count => {
                tracing::warn!(statement_id, rows = count, "单行查询返回多行");
                Err(PersistenceError::TooManyResults {
                    statement_id: statement_id.to_string(),
                    rows: count,
                })
            }
        }
    }

    fn update(&mut self, statement_id: &str, param: &impl Serialize) -> Result<usize> {
        let param = to_parameter(param)?;
        log_failure("update", statement_id, self.executor.update(statement_id, param.as_ref()))
    }

    fn insert(&mut self, statement_id: &str, param: &impl Serialize) -> Result<usize> {
        let param = to_parameter(param)?;
        log_failure("insert", statement_id, self.executor.insert(statement_id, param.as_ref()))
    }

    fn delete(&mut self, statement_id: &str, param: &impl Serialize) -> Result<usize> {
        let param = to_parameter(param)?;
        log_failure("delete", statement_id, self.executor.delete(statement_id, param.as_ref()))
    }

    fn commit(&mut self) {
        tracing::debug!("会话提交");
        self.executor.commit();
    }

    fn rollback(&mut self) {
        tracing::debug!("会话回滚");
        self.executor.rollback();
    }

    fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }
}
