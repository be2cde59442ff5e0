//! 数据源
//!
//! 执行器只依赖 `DataSource` 这一获取连接的接口。内置的 `SqliteDataSource`
//! 采用单连接 + `Mutex` 的方式，多个会话共享同一个数据源时串行访问连接。

use crate::data::{PersistenceError, Result};
use rusqlite::Connection;
use std::fmt;
use std::ops::DerefMut;
use std::path::Path;
use std::sync::Mutex;

/// 从数据源借出的连接，离开作用域即归还
pub type PooledConnection<'a> = Box<dyn DerefMut<Target = Connection> + 'a>;

/// 连接提供者
pub trait DataSource: Send + Sync + fmt::Debug {
    /// 获取连接
    ///
    /// 失败时返回 `PersistenceError::Connection`，核心层不重试。
    fn get_connection(&self) -> Result<PooledConnection<'_>>;
}

/// SQLite 数据源
#[derive(Debug)]
pub struct SqliteDataSource {
    conn: Mutex<Connection>,
    url: String,
}

impl SqliteDataSource {
    /// 打开文件数据库，自动创建父目录
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PersistenceError::io(parent.to_path_buf(), e))?;
            }
        }

        let conn = Connection::open(path).map_err(|e| {
            PersistenceError::connection(format!("无法打开数据库 {}: {}", path.display(), e))
        })?;
        Self::with_connection(conn, path.display().to_string())
    }

    /// 打开内存数据库（用于测试）
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| PersistenceError::connection(format!("无法打开内存数据库: {}", e)))?;
        Self::with_connection(conn, ":memory:".to_string())
    }

    fn with_connection(conn: Connection, url: String) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| PersistenceError::connection(e.to_string()))?;

        tracing::debug!(url = %url, "数据源已打开");

        Ok(Self {
            conn: Mutex::new(conn),
            url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 执行原始 SQL（用于建表等 DDL 操作）
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

impl DataSource for SqliteDataSource {
    fn get_connection(&self) -> Result<PooledConnection<'_>> {
        let guard = self
            .conn
            .lock()
            .map_err(|e| PersistenceError::connection(format!("数据库连接不可用: {}", e)))?;
        Ok(Box::new(guard))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_in_memory() {
        let data_source = SqliteDataSource::open_in_memory().unwrap();
        assert_eq!(data_source.url(), ":memory:");

        let conn = data_source.get_connection().unwrap();
        let version: String = conn
            .query_row("SELECT sqlite_version()", [], |row| row.get(0))
            .unwrap();
        assert!(!version.is_empty());
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("app.db");
        let data_source = SqliteDataSource::open(&db_path).unwrap();

        data_source
            .execute_batch("CREATE TABLE person (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_execute_batch_error_is_database_error() {
        let data_source = SqliteDataSource::open_in_memory().unwrap();
        let err = data_source.execute_batch("CREATE TABLE").unwrap_err();
        assert!(matches!(err, PersistenceError::Database(_)));
    }
}
