// ==========================================
// Wareflow 仓储管理 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 表格数据导入管道（解析 → 映射 → 校验 → 提交）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与导入中间类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 管道入口与向导会话
pub mod api;

// 应用层 - 共享状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 导入中间类型
pub use domain::import::{
    ColumnMapping, CommitResult, FieldKey, ImportField, ImportStep, ParsedFile, RawRow,
    ValidationIssue, ValidationResult, IMPORT_FIELDS,
};

// 领域实体
pub use domain::inventory::{Product, Sector, Warehouse, Zone};

// API
pub use api::{ApiError, ApiResult, ImportApi, ImportSession};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Wareflow";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
