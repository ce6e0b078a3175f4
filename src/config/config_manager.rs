// ==========================================
// Wareflow 仓储管理 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value, scope_id='global')
// ==========================================

use crate::config::import_config_trait::{
    ImportConfigReader, DEFAULT_MAX_FILE_SIZE_BYTES, DEFAULT_SECTOR_NAME, DEFAULT_UNIT,
    DEFAULT_WAREHOUSE_FLOORS, DEFAULT_WAREHOUSE_NAME,
};
use crate::db::{configure_sqlite_connection, init_schema, open_and_init};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_and_init(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取可解析的配置值；格式错误时告警并回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: std::str::FromStr + std::fmt::Display + Copy,
    {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(
                        config_key = key,
                        raw_value = %raw,
                        default = %default,
                        "配置值格式错误，使用默认值"
                    );
                    Ok(default)
                }
            },
        }
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&json!(config_map))
            .map_err(|e| RepositoryError::InternalError(e.to_string()))
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_max_file_size_bytes(&self) -> RepositoryResult<u64> {
        let value = self.get_parsed_or_default(
            config_keys::IMPORT_MAX_FILE_SIZE_BYTES,
            DEFAULT_MAX_FILE_SIZE_BYTES,
        )?;
        // 0 视为未配置
        Ok(if value == 0 { DEFAULT_MAX_FILE_SIZE_BYTES } else { value })
    }

    async fn get_default_warehouse_name(&self) -> RepositoryResult<String> {
        let value = self.get_config_or_default(
            config_keys::IMPORT_DEFAULT_WAREHOUSE_NAME,
            DEFAULT_WAREHOUSE_NAME,
        )?;
        let trimmed = value.trim();
        Ok(if trimmed.is_empty() {
            DEFAULT_WAREHOUSE_NAME.to_string()
        } else {
            trimmed.to_string()
        })
    }

    async fn get_default_warehouse_floors(&self) -> RepositoryResult<i32> {
        let value = self.get_parsed_or_default(
            config_keys::IMPORT_DEFAULT_WAREHOUSE_FLOORS,
            DEFAULT_WAREHOUSE_FLOORS,
        )?;
        Ok(if value < 1 { DEFAULT_WAREHOUSE_FLOORS } else { value })
    }

    async fn get_default_sector_name(&self) -> RepositoryResult<String> {
        let value =
            self.get_config_or_default(config_keys::IMPORT_DEFAULT_SECTOR_NAME, DEFAULT_SECTOR_NAME)?;
        let trimmed = value.trim();
        Ok(if trimmed.is_empty() {
            DEFAULT_SECTOR_NAME.to_string()
        } else {
            trimmed.to_string()
        })
    }

    async fn get_default_unit(&self) -> RepositoryResult<String> {
        let value = self.get_config_or_default(config_keys::IMPORT_DEFAULT_UNIT, DEFAULT_UNIT)?;
        let trimmed = value.trim();
        Ok(if trimmed.is_empty() {
            DEFAULT_UNIT.to_string()
        } else {
            trimmed.to_string()
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 文件限制
    pub const IMPORT_MAX_FILE_SIZE_BYTES: &str = "import_max_file_size_bytes";

    // 惰性创建的父实体
    pub const IMPORT_DEFAULT_WAREHOUSE_NAME: &str = "import_default_warehouse_name";
    pub const IMPORT_DEFAULT_WAREHOUSE_FLOORS: &str = "import_default_warehouse_floors";
    pub const IMPORT_DEFAULT_SECTOR_NAME: &str = "import_default_sector_name";

    // 商品默认值
    pub const IMPORT_DEFAULT_UNIT: &str = "import_default_unit";
}
