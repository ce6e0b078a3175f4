// ==========================================
// Wareflow 仓储管理 - 导入管道 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 解析 → 映射推断 → 行校验 → 提交
// ==========================================

use crate::domain::import::{
    ColumnMapping, CommitResult, ImportField, ParsedFile, RawRow, ValidationResult,
};
use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// TabularParser Trait
// ==========================================
// 用途: 表格文件解析接口（阶段 0）
// 实现者: CsvParser
pub trait TabularParser: Send + Sync {
    /// 解析文件内容为表头 + 行记录
    ///
    /// # 参数
    /// - file_name: 文件名（用于扩展名检查）
    /// - content: 文件原始字节
    ///
    /// # 返回
    /// - Ok(ParsedFile): 表头（互不相同）与行记录（文件顺序）
    /// - Err: 文件过大、扩展名不支持、无表头、无数据行、结构错误
    fn parse_bytes(&self, file_name: &str, content: &[u8]) -> ImportResult<ParsedFile>;
}

// ==========================================
// HeaderMatcher Trait
// ==========================================
// 用途: 单一列名匹配策略（精确 / 部分）
// 实现者: ExactMatch, PartialMatch
pub trait HeaderMatcher: Send + Sync {
    /// 策略名（日志用）
    fn name(&self) -> &'static str;

    /// 判断列名是否匹配字段
    fn matches(&self, header: &str, field: &ImportField) -> bool;
}

// ==========================================
// MappingInferencer Trait
// ==========================================
// 用途: 列映射推断接口（阶段 1）
// 实现者: HeuristicMappingInferencer
pub trait MappingInferencer: Send + Sync {
    /// 推断列映射（从不失败，无法推断的字段保持未映射）
    ///
    /// # 参数
    /// - headers: 文件表头（文件列顺序）
    /// - fields: 字段表（字段表顺序）
    fn infer(&self, headers: &[String], fields: &[ImportField]) -> ColumnMapping;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 行校验接口（阶段 2）
// 实现者: InventoryRowValidator
pub trait RowValidator: Send + Sync {
    /// 校验全部行
    ///
    /// # 返回
    /// - ValidationResult: 同样输入必得同样结果
    fn validate(&self, rows: &[RawRow], mapping: &ColumnMapping) -> ValidationResult;
}

// ==========================================
// ProductImporter Trait
// ==========================================
// 用途: 提交接口（阶段 3，唯一有副作用的阶段）
// 实现者: ProductImporterImpl
#[async_trait]
pub trait ProductImporter: Send + Sync {
    /// 提交行记录为商品
    ///
    /// # 参数
    /// - rows: 行记录（调用方应已校验通过）
    /// - mapping: 冻结的列映射
    ///
    /// # 返回
    /// - Ok(CommitResult): 导入数量、批次号、解析出的仓库/区域
    /// - Err: 存储层错误原样上抛，已插入行数视为 0
    async fn commit(&self, rows: &[RawRow], mapping: &ColumnMapping)
        -> ImportResult<CommitResult>;
}
