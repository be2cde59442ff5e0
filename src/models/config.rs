// 持久层配置结构：数据源 + 日志

use crate::data::{DataSource, PersistenceError, Result, SqliteDataSource};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// 内存数据库的 URL
pub const IN_MEMORY_URL: &str = ":memory:";

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// 日志输出目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub output: LogOutput,
    /// 日志目录（文件输出时使用，缺省为 ~/.sqlmapper/logs）
    #[serde(default)]
    pub file_path: Option<String>,
}

/// 数据源配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// 数据库文件路径，`:memory:` 表示内存数据库
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_url() -> String {
    IN_MEMORY_URL.to_string()
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

impl DataSourceConfig {
    /// 打开数据源
    pub fn open(&self) -> Result<Arc<dyn DataSource>> {
        let data_source = if self.url == IN_MEMORY_URL {
            SqliteDataSource::open_in_memory()?
        } else {
            SqliteDataSource::open(Path::new(&self.url))?
        };
        Ok(Arc::new(data_source))
    }
}

/// 持久层全局配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub data_source: DataSourceConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl PersistenceConfig {
    /// 从 TOML 文件加载配置
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| PersistenceError::io(path.to_path_buf(), e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(Into::into)
    }
}
