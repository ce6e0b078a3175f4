// ==========================================
// Wareflow 仓储管理 - 导入层
// ==========================================
// 职责: 表格文件 → 商品记录
// 流程: 解析 → 映射推断 → 行校验 → 提交
// 支持: CSV
// ==========================================

// 模块声明
pub mod error;
pub mod file_parser;
pub mod importer_trait;
pub mod mapping_inferencer;
pub mod number;
pub mod product_coercion;
pub mod product_importer;
pub mod row_validator;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::CsvParser;
pub use mapping_inferencer::{ExactMatch, HeuristicMappingInferencer, PartialMatch};
pub use product_coercion::{coerce_row, resolve_sector_name, ProductFields};
pub use product_importer::ProductImporterImpl;
pub use row_validator::InventoryRowValidator;

// 重导出 Trait 接口
pub use importer_trait::{
    HeaderMatcher, MappingInferencer, ProductImporter, RowValidator, TabularParser,
};
