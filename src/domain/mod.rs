// ==========================================
// Wareflow 仓储管理 - 领域模型层
// ==========================================
// 职责: 定义领域实体与导入管道的中间类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod import;
pub mod inventory;

// 重导出核心类型
pub use import::{
    import_field, ColumnMapping, CommitResult, FieldKey, ImportField, ImportStep, ParsedFile,
    RawRow, ValidationIssue, ValidationResult, IMPORT_FIELDS,
};
pub use inventory::{
    NewProduct, NewSector, NewWarehouse, NewZone, Product, Sector, Warehouse, Zone,
};
