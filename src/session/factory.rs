//! 会话工厂

use crate::core::logger;
use crate::data::Result;
use crate::models::PersistenceConfig;
use crate::session::{Configuration, DefaultSqlSession};
use std::sync::Arc;

/// 会话工厂
///
/// 持有只读共享的配置，每次 `open_session` 创建一个独立会话。工厂可以跨线程共享，
/// 会话不可以。
#[derive(Debug, Clone)]
pub struct SqlSessionFactory {
    configuration: Arc<Configuration>,
}

impl SqlSessionFactory {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            configuration: Arc::new(configuration),
        }
    }

    pub fn open_session(&self) -> DefaultSqlSession {
        DefaultSqlSession::new(Arc::clone(&self.configuration))
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }
}

/// 从持久层配置构建会话工厂
pub struct SqlSessionFactoryBuilder;

impl SqlSessionFactoryBuilder {
    /// 打开数据源并执行注册回调
    ///
    /// # 参数
    ///
    /// - `config`: 持久层配置（数据源 + 日志）
    /// - `register`: 注册类型、语句与 mapper 接口
    ///
    /// # 示例
    ///
    /// ```ignore
    /// let config = PersistenceConfig::load(Path::new("sqlmapper.toml"))?;
    /// let factory = SqlSessionFactoryBuilder::build(&config, |configuration| {
    ///     configuration.register_type::<Person>("model.Person")?;
    ///     configuration
    ///         .mapper("mapper.PersonMapper")
    ///         .statement(StatementDef::select("findAll", "select * from person").result_type("model.Person"))
    ///         .build()
    /// })?;
    /// ```
    pub fn build<F>(config: &PersistenceConfig, register: F) -> Result<SqlSessionFactory>
    where
        F: FnOnce(&mut Configuration) -> Result<()>,
    {
        let data_source = config.data_source.open()?;
        let mut configuration = Configuration::new(data_source);
        register(&mut configuration)?;

        tracing::info!(
            url = %config.data_source.url,
            statements = configuration.statement_ids().count(),
            "会话工厂已创建"
        );
        Ok(SqlSessionFactory::new(configuration))
    }

    /// 先按配置初始化日志，再构建会话工厂
    ///
    /// 日志初始化失败（例如全局订阅者已被设置）只记录警告，不影响工厂创建。
    pub fn build_with_logging<F>(config: &PersistenceConfig, register: F) -> Result<SqlSessionFactory>
    where
        F: FnOnce(&mut Configuration) -> Result<()>,
    {
        if let Err(e) = logger::init_logger(&config.log) {
            eprintln!("日志初始化失败: {:#}", e);
        }
        Self::build(config, register)
    }
}
