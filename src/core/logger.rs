use crate::models::config::{LogConfig, LogFormat, LogLevel, LogOutput};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    reload::{self, Handle},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// 日志文件名前缀
const LOG_FILE_PREFIX: &str = "sqlmapper";

/// 全局日志级别 reload handle
static LOG_LEVEL_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

/// 初始化日志系统
///
/// 支持基于配置的日志输出，包括：
/// - 日志级别（trace/debug/info/warn/error）
/// - 输出格式（JSON/纯文本）
/// - 输出目标（控制台/文件/both）
///
/// 日志级别可以通过 `update_log_level` 动态调整，其他配置只在初始化时生效。
/// 设置了 `RUST_LOG` 环境变量时以环境变量为准。
///
/// # 示例
/// ```ignore
/// use sqlmapper::core::init_logger;
/// use sqlmapper::models::LogConfig;
///
/// init_logger(&LogConfig::default())?;
/// ```
pub fn init_logger(config: &LogConfig) -> anyhow::Result<()> {
    if LOG_LEVEL_HANDLE.get().is_some() {
        anyhow::bail!("日志系统已初始化，不能重复初始化");
    }

    let (filter_layer, reload_handle) = reload::Layer::new(create_env_filter(config.level));

    let console_layer = match config.output {
        LogOutput::Console | LogOutput::Both => Some(create_console_layer(config.format)),
        LogOutput::File => None,
    };
    let file_layer = match config.output {
        LogOutput::File | LogOutput::Both => {
            Some(create_file_layer(config.format, config.file_path.as_deref())?)
        }
        LogOutput::Console => None,
    };

    Registry::default()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("设置全局日志订阅者失败: {}", e))?;

    if LOG_LEVEL_HANDLE.set(reload_handle).is_err() {
        anyhow::bail!("日志系统已初始化，不能重复初始化");
    }

    tracing::info!(
        level = config.level.as_str(),
        format = ?config.format,
        output = ?config.output,
        file_path = ?config.file_path,
        "日志系统初始化完成"
    );

    Ok(())
}

/// 默认过滤规则：本库使用指定级别，rusqlite 只输出警告
fn filter_directives(level: LogLevel) -> String {
    format!("sqlmapper={},rusqlite=warn", level.as_str())
}

fn create_env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(level)))
}

fn create_console_layer<S>(format: LogFormat) -> BoxedLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(cfg!(debug_assertions))
            .with_thread_ids(false)
            .with_ansi(true)
            .with_span_events(if cfg!(debug_assertions) {
                FmtSpan::CLOSE
            } else {
                FmtSpan::NONE
            })
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .with_target(cfg!(debug_assertions))
            .with_thread_ids(false)
            .boxed(),
    }
}

/// 按天滚动的文件输出层
fn create_file_layer<S>(format: LogFormat, file_path: Option<&str>) -> anyhow::Result<BoxedLayer<S>>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let log_dir = get_log_dir(file_path)?;
    let file_appender = rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = non_blocking(file_appender);

    // guard 被 drop 后后台写线程退出，需要与进程同生命周期
    Box::leak(Box::new(guard));

    let layer = match format {
        LogFormat::Text => fmt::layer()
            .with_writer(writer)
            .with_target(cfg!(debug_assertions))
            .with_ansi(false)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(false)
            .boxed(),
    };
    Ok(layer)
}

/// 获取日志目录，缺省为 `~/.sqlmapper/logs`
fn get_log_dir(file_path: Option<&str>) -> anyhow::Result<PathBuf> {
    let dir = match file_path {
        Some(path) => PathBuf::from(path),
        None => dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("无法获取用户主目录"))?
            .join(".sqlmapper")
            .join("logs"),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// 动态更新日志级别（热重载）
///
/// 日志系统未初始化时返回错误。
pub fn update_log_level(new_level: LogLevel) -> anyhow::Result<()> {
    let handle = LOG_LEVEL_HANDLE
        .get()
        .ok_or_else(|| anyhow::anyhow!("日志系统未初始化"))?;

    handle
        .reload(create_env_filter(new_level))
        .map_err(|e| anyhow::anyhow!("重载日志级别失败: {}", e))?;

    tracing::info!(new_level = new_level.as_str(), "日志级别已动态更新");
    Ok(())
}
