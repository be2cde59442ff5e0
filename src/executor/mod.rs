//! 语句执行器
//!
//! # 模块组织
//!
//! - `parameter`: 按占位符顺序从参数对象取值
//! - `simple`: 直接访问数据源，带会话级一级缓存
//! - `caching`: 包装其他执行器，增加命名空间级二级缓存
//!
//! 会话默认使用 `CachingExecutor(SimpleExecutor)` 的组合。

pub mod caching;
pub mod parameter;
pub mod simple;

pub use caching::CachingExecutor;
pub use parameter::bind_parameters;
pub use simple::SimpleExecutor;

use crate::data::Result;
use crate::types::ResultList;
use serde_json::Value as JsonValue;

/// 执行器接口
///
/// 参数为序列化后的参数对象，`None` 表示调用时没有参数。
pub trait Executor: Send {
    /// 执行查询，返回物化后的结果列表
    fn select(&mut self, statement_id: &str, param: Option<&JsonValue>) -> Result<ResultList>;

    /// 执行写语句，返回影响行数
    fn update(&mut self, statement_id: &str, param: Option<&JsonValue>) -> Result<usize>;

    fn insert(&mut self, statement_id: &str, param: Option<&JsonValue>) -> Result<usize> {
        self.update(statement_id, param)
    }

    fn delete(&mut self, statement_id: &str, param: Option<&JsonValue>) -> Result<usize> {
        self.update(statement_id, param)
    }

    /// 提交：清理本执行器持有的会话状态
    fn commit(&mut self);

    /// 回滚：丢弃尚未提交的会话状态
    fn rollback(&mut self);
}
