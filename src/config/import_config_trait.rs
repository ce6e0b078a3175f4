// ==========================================
// Wareflow 仓储管理 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 文件大小上限默认值（10 MiB）
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_WAREHOUSE_NAME: &str = "Main Warehouse";
pub const DEFAULT_WAREHOUSE_FLOORS: i32 = 6;
pub const DEFAULT_SECTOR_NAME: &str = "Default";
pub const DEFAULT_UNIT: &str = "pcs";

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）、ImportDefaults（固定值）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取导入文件大小上限（字节）
    ///
    /// # 默认值
    /// - 10485760（10 MiB）
    async fn get_max_file_size_bytes(&self) -> RepositoryResult<u64>;

    /// 获取默认仓库名称（首次导入时惰性创建）
    ///
    /// # 默认值
    /// - "Main Warehouse"
    async fn get_default_warehouse_name(&self) -> RepositoryResult<String>;

    /// 获取默认仓库楼层数
    ///
    /// # 默认值
    /// - 6
    async fn get_default_warehouse_floors(&self) -> RepositoryResult<i32>;

    /// 获取默认区域名称（未映射 sector 列或首行为空时使用）
    ///
    /// # 默认值
    /// - "Default"
    async fn get_default_sector_name(&self) -> RepositoryResult<String>;

    /// 获取默认计量单位
    ///
    /// # 默认值
    /// - "pcs"
    async fn get_default_unit(&self) -> RepositoryResult<String>;

    /// 一次性读取全部导入默认值
    async fn load_import_defaults(&self) -> RepositoryResult<ImportDefaults> {
        Ok(ImportDefaults {
            max_file_size_bytes: self.get_max_file_size_bytes().await?,
            warehouse_name: self.get_default_warehouse_name().await?,
            warehouse_floors: self.get_default_warehouse_floors().await?,
            sector_name: self.get_default_sector_name().await?,
            unit: self.get_default_unit().await?,
        })
    }
}

// ==========================================
// ImportDefaults - 导入默认值快照
// ==========================================
// 用途: 传入纯函数（行 → 商品字段），也可直接作为固定配置使用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDefaults {
    pub max_file_size_bytes: u64,
    pub warehouse_name: String,
    pub warehouse_floors: i32,
    pub sector_name: String,
    pub unit: String,
}

impl Default for ImportDefaults {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            warehouse_name: DEFAULT_WAREHOUSE_NAME.to_string(),
            warehouse_floors: DEFAULT_WAREHOUSE_FLOORS,
            sector_name: DEFAULT_SECTOR_NAME.to_string(),
            unit: DEFAULT_UNIT.to_string(),
        }
    }
}

#[async_trait]
impl ImportConfigReader for ImportDefaults {
    async fn get_max_file_size_bytes(&self) -> RepositoryResult<u64> {
        Ok(self.max_file_size_bytes)
    }

    async fn get_default_warehouse_name(&self) -> RepositoryResult<String> {
        Ok(self.warehouse_name.clone())
    }

    async fn get_default_warehouse_floors(&self) -> RepositoryResult<i32> {
        Ok(self.warehouse_floors)
    }

    async fn get_default_sector_name(&self) -> RepositoryResult<String> {
        Ok(self.sector_name.clone())
    }

    async fn get_default_unit(&self) -> RepositoryResult<String> {
        Ok(self.unit.clone())
    }

    async fn load_import_defaults(&self) -> RepositoryResult<ImportDefaults> {
        Ok(self.clone())
    }
}
