// ==========================================
// Wareflow 仓储管理 - 导入向导会话
// ==========================================
// 步骤: 选择文件 → 预览 → 列映射 → 校验 → 完成
// 状态: 解析结果、列映射、提交中标记、提交结果
// 约束: 同一会话不允许重叠提交（importing 标记）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::import_api::ImportApi;
use crate::config::ImportConfigReader;
use crate::domain::import::{
    ColumnMapping, CommitResult, FieldKey, ImportStep, ParsedFile, RawRow, ValidationResult,
    IMPORT_FIELDS,
};
use crate::importer::{HeuristicMappingInferencer, InventoryRowValidator, MappingInferencer, RowValidator};
use crate::repository::InventoryStore;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// 预览页展示示例值的字段
const SAMPLE_FIELDS: [FieldKey; 3] = [FieldKey::Sku, FieldKey::Name, FieldKey::Quantity];

// ==========================================
// ImportSession - 向导会话
// ==========================================
pub struct ImportSession {
    step: ImportStep,
    file: Option<ParsedFile>,
    mapping: ColumnMapping,
    importing: bool,
    last_result: Option<CommitResult>,
    last_error: Option<String>,
    inferencer: Box<dyn MappingInferencer>,
    validator: InventoryRowValidator,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSession {
    pub fn new() -> Self {
        Self::with_inferencer(Box::new(HeuristicMappingInferencer::default()))
    }

    pub fn with_inferencer(inferencer: Box<dyn MappingInferencer>) -> Self {
        Self {
            step: ImportStep::FileSelection,
            file: None,
            mapping: ColumnMapping::new(),
            importing: false,
            last_result: None,
            last_error: None,
            inferencer,
            validator: InventoryRowValidator::new(),
        }
    }

    // ==========================================
    // 状态查询
    // ==========================================

    pub fn step(&self) -> ImportStep {
        self.step
    }

    pub fn file(&self) -> Option<&ParsedFile> {
        self.file.as_ref()
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    pub fn is_importing(&self) -> bool {
        self.importing
    }

    pub fn last_result(&self) -> Option<&CommitResult> {
        self.last_result.as_ref()
    }

    /// 已导入数量（仅在完成步骤有值）
    pub fn imported_count(&self) -> Option<usize> {
        self.last_result.as_ref().map(|r| r.imported)
    }

    /// 最近一次提交失败的提示
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn rows(&self) -> &[RawRow] {
        self.file.as_ref().map(|f| f.rows.as_slice()).unwrap_or(&[])
    }

    fn headers(&self) -> &[String] {
        self.file.as_ref().map(|f| f.headers.as_slice()).unwrap_or(&[])
    }

    /// 前 n 行
    pub fn preview(&self, n: usize) -> &[RawRow] {
        let rows = self.rows();
        &rows[..n.min(rows.len())]
    }

    /// 首行中 sku/name/quantity 已映射列的值
    pub fn sample_values(&self) -> BTreeMap<FieldKey, String> {
        let Some(first) = self.rows().first() else {
            return BTreeMap::new();
        };
        SAMPLE_FIELDS
            .iter()
            .filter_map(|key| {
                self.mapping
                    .cell(first, *key)
                    .map(|value| (*key, value.to_string()))
            })
            .collect()
    }

    pub fn mapped_count(&self) -> usize {
        self.mapping.mapped_count()
    }

    pub fn required_mapped(&self) -> bool {
        self.mapping.required_mapped()
    }

    /// 当前映射下的校验结果
    pub fn validation(&self) -> ValidationResult {
        self.validator.validate(self.rows(), &self.mapping)
    }

    // ==========================================
    // 文件与映射
    // ==========================================

    /// 载入解析结果，进入预览步骤并填入推断映射
    pub fn load_file(&mut self, mut parsed: ParsedFile, file_name: impl Into<String>) -> ApiResult<()> {
        if self.step != ImportStep::FileSelection {
            return Err(self.transition_error(ImportStep::Preview));
        }

        parsed.file_name = file_name.into();
        self.mapping = self.inferencer.infer(&parsed.headers, &IMPORT_FIELDS);
        info!(
            file_name = %parsed.file_name,
            rows = parsed.row_count(),
            mapped = self.mapping.mapped_count(),
            "导入文件已载入"
        );
        self.file = Some(parsed);
        self.step = ImportStep::Preview;
        Ok(())
    }

    /// 手动指定字段对应的列（空列名等同于清除）
    pub fn set_field(&mut self, key: FieldKey, header: &str) -> ApiResult<()> {
        self.ensure_file_loaded()?;
        if header.is_empty() {
            self.mapping.clear(key);
            return Ok(());
        }
        if !self.headers().iter().any(|h| h == header) {
            return Err(ApiError::InvalidInput(format!("Unknown column: {}", header)));
        }
        self.mapping.set(key, header);
        debug!(field = %key, header, "字段映射已修改");
        Ok(())
    }

    pub fn clear_field(&mut self, key: FieldKey) -> ApiResult<()> {
        self.ensure_file_loaded()?;
        self.mapping.clear(key);
        Ok(())
    }

    /// 恢复为推断映射
    pub fn reset_mapping(&mut self) -> ApiResult<()> {
        self.ensure_file_loaded()?;
        self.mapping = self.inferencer.infer(self.headers(), &IMPORT_FIELDS);
        Ok(())
    }

    // ==========================================
    // 步骤切换
    // ==========================================

    pub fn next(&mut self) -> ApiResult<ImportStep> {
        let target = match self.step {
            ImportStep::Preview => ImportStep::ColumnMapping,
            ImportStep::ColumnMapping => {
                let missing = self.mapping.missing_required();
                if !missing.is_empty() {
                    let labels: Vec<&str> = missing.iter().map(|f| f.label).collect();
                    return Err(ApiError::ValidationError(format!(
                        "Required fields not mapped: {}",
                        labels.join(", ")
                    )));
                }
                ImportStep::Validation
            }
            // 选择文件通过 load_file 前进，校验步骤通过 import 前进
            ImportStep::FileSelection | ImportStep::Validation | ImportStep::Complete => {
                return Err(self.transition_error(self.step));
            }
        };
        self.step = target;
        Ok(target)
    }

    pub fn back(&mut self) -> ApiResult<ImportStep> {
        if self.importing {
            return Err(ApiError::ImportInProgress);
        }
        let target = match self.step {
            ImportStep::Preview => {
                self.file = None;
                self.mapping = ColumnMapping::new();
                ImportStep::FileSelection
            }
            ImportStep::ColumnMapping => ImportStep::Preview,
            ImportStep::Validation => ImportStep::ColumnMapping,
            ImportStep::FileSelection | ImportStep::Complete => {
                return Err(self.transition_error(self.step));
            }
        };
        self.last_error = None;
        self.step = target;
        Ok(target)
    }

    // ==========================================
    // 提交
    // ==========================================

    /// 开始提交：校验通过后置 importing 标记，返回待提交的数据快照
    ///
    /// 会话被多个调用方共享（如置于锁内）时，先 begin 后 finish，
    /// 期间的第二次 begin 返回 ImportInProgress
    pub fn begin_import(&mut self) -> ApiResult<(Vec<RawRow>, ColumnMapping)> {
        if self.importing {
            return Err(ApiError::ImportInProgress);
        }
        if self.step != ImportStep::Validation {
            return Err(self.transition_error(ImportStep::Complete));
        }

        let validation = self.validation();
        if !validation.is_valid {
            return Err(ApiError::ValidationError(format!(
                "{} error(s) must be fixed before import",
                validation.error_count()
            )));
        }

        self.importing = true;
        self.last_error = None;
        Ok((self.rows().to_vec(), self.mapping.clone()))
    }

    /// 结束提交：成功进入完成步骤，失败保留当前步骤并记录提示
    pub fn finish_import(&mut self, outcome: ApiResult<CommitResult>) -> ApiResult<CommitResult> {
        self.importing = false;
        match outcome {
            Ok(result) => {
                self.step = ImportStep::Complete;
                self.last_result = Some(result.clone());
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, "导入提交失败");
                self.last_error = Some(format!("Import failed: {}", e));
                Err(e)
            }
        }
    }

    /// 提交当前文件
    pub async fn import<S, C>(&mut self, api: &ImportApi<S, C>) -> ApiResult<CommitResult>
    where
        S: InventoryStore,
        C: ImportConfigReader,
    {
        let (rows, mapping) = self.begin_import()?;
        let outcome = api.commit(&rows, &mapping).await;
        self.finish_import(outcome)
    }

    /// 重新开始（导入另一个文件）
    pub fn import_another(&mut self) -> ApiResult<()> {
        if self.importing {
            return Err(ApiError::ImportInProgress);
        }
        self.step = ImportStep::FileSelection;
        self.file = None;
        self.mapping = ColumnMapping::new();
        self.last_result = None;
        self.last_error = None;
        Ok(())
    }

    fn ensure_file_loaded(&self) -> ApiResult<()> {
        if self.file.is_none() {
            return Err(ApiError::InvalidInput("No file loaded".to_string()));
        }
        Ok(())
    }

    fn transition_error(&self, to: ImportStep) -> ApiError {
        ApiError::InvalidStepTransition {
            from: self.step.to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportDefaults;
    use crate::repository::SqliteInventoryStore;
    use std::sync::Arc;

    fn parsed(content: &str) -> ParsedFile {
        use crate::importer::{CsvParser, TabularParser};
        CsvParser::default()
            .parse_bytes("upload.csv", content.as_bytes())
            .unwrap()
    }

    #[test]
    fn test_load_file_seeds_mapping() {
        let mut session = ImportSession::new();
        session
            .load_file(parsed("SKU,Name,Quantity\nX1,Widget,10\n"), "stock.csv")
            .unwrap();

        assert_eq!(session.step(), ImportStep::Preview);
        assert_eq!(session.file().unwrap().file_name, "stock.csv");
        assert_eq!(session.mapped_count(), 3);
        assert!(session.required_mapped());
        assert_eq!(
            session.sample_values().get(&FieldKey::Name).map(String::as_str),
            Some("Widget")
        );
    }

    #[test]
    fn test_next_requires_required_fields() {
        let mut session = ImportSession::new();
        session
            .load_file(parsed("Code,Title,Qty\nX1,Widget,10\n"), "stock.csv")
            .unwrap();
        assert_eq!(session.next().unwrap(), ImportStep::ColumnMapping);
        let err = session.next().unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
        assert_eq!(
            err.to_string(),
            "Validation failed: Required fields not mapped: SKU, Name, Quantity"
        );

        session.set_field(FieldKey::Sku, "Code").unwrap();
        session.set_field(FieldKey::Name, "Title").unwrap();
        session.set_field(FieldKey::Quantity, "Qty").unwrap();
        assert_eq!(session.next().unwrap(), ImportStep::Validation);
        assert!(session.validation().is_valid);
    }

    #[test]
    fn test_set_field_rejects_unknown_header() {
        let mut session = ImportSession::new();
        assert!(session.set_field(FieldKey::Sku, "SKU").is_err());

        session
            .load_file(parsed("SKU,Name,Quantity\nX1,Widget,10\n"), "stock.csv")
            .unwrap();
        let err = session.set_field(FieldKey::Sku, "Missing").unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert_eq!(err.to_string(), "Invalid input: Unknown column: Missing");

        session.set_field(FieldKey::Sku, "").unwrap();
        assert!(!session.required_mapped());
        session.reset_mapping().unwrap();
        assert!(session.required_mapped());
    }

    #[test]
    fn test_back_from_preview_discards_file() {
        let mut session = ImportSession::new();
        session
            .load_file(parsed("SKU,Name,Quantity\nX1,Widget,10\n"), "stock.csv")
            .unwrap();
        assert_eq!(session.back().unwrap(), ImportStep::FileSelection);
        assert!(session.file().is_none());
        assert_eq!(session.mapped_count(), 0);
        assert!(session.back().is_err());
    }

    #[test]
    fn test_preview_is_bounded() {
        let mut session = ImportSession::new();
        session
            .load_file(parsed("SKU\nA\nB\nC\n"), "stock.csv")
            .unwrap();
        assert_eq!(session.preview(2).len(), 2);
        assert_eq!(session.preview(10).len(), 3);
    }

    #[test]
    fn test_overlapping_import_rejected() {
        let mut session = ImportSession::new();
        session
            .load_file(parsed("SKU,Name,Quantity\nX1,Widget,10\n"), "stock.csv")
            .unwrap();
        session.next().unwrap();
        session.next().unwrap();

        let (rows, _) = session.begin_import().unwrap();
        assert_eq!(rows.len(), 1);
        assert!(session.is_importing());
        assert!(matches!(session.begin_import(), Err(ApiError::ImportInProgress)));
        assert!(matches!(session.back(), Err(ApiError::ImportInProgress)));

        let failed = session.finish_import(Err(ApiError::DatabaseError("disk full".to_string())));
        assert!(failed.is_err());
        assert!(!session.is_importing());
        assert_eq!(session.step(), ImportStep::Validation);
        assert!(session.last_error().unwrap().contains("disk full"));
    }

    #[tokio::test]
    async fn test_import_and_import_another() {
        let api = ImportApi::with_components(
            Arc::new(SqliteInventoryStore::in_memory().unwrap()),
            Arc::new(ImportDefaults::default()),
        );
        let mut session = ImportSession::new();
        session
            .load_file(parsed("SKU,Name,Quantity\nX1,Widget,10\nX2,Gadget,3\n"), "stock.csv")
            .unwrap();
        session.next().unwrap();
        session.next().unwrap();

        let result = session.import(&api).await.unwrap();
        assert_eq!(result.imported, 2);
        assert_eq!(session.step(), ImportStep::Complete);
        assert_eq!(session.imported_count(), Some(2));

        session.import_another().unwrap();
        assert_eq!(session.step(), ImportStep::FileSelection);
        assert!(session.last_result().is_none());
    }

    #[tokio::test]
    async fn test_import_refused_with_errors() {
        let api = ImportApi::with_components(
            Arc::new(SqliteInventoryStore::in_memory().unwrap()),
            Arc::new(ImportDefaults::default()),
        );
        let mut session = ImportSession::new();
        session
            .load_file(parsed("SKU,Name,Quantity\n,Bad,oops\n"), "stock.csv")
            .unwrap();
        session.next().unwrap();
        session.next().unwrap();

        assert!(matches!(session.import(&api).await, Err(ApiError::ValidationError(_))));
        assert!(!session.is_importing());
        assert_eq!(session.step(), ImportStep::Validation);
    }
}
