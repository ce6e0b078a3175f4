// ==========================================
// Wareflow 仓储管理 - 导入API
// ==========================================
// 职责: 封装导入管道入口，供界面层调用
// 入口: 解析文件 / 推断映射 / 校验 / 提交
// 附加: 初始化状态查询、库存重置
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::open_and_init;
use crate::domain::import::{
    ColumnMapping, CommitResult, ImportField, ParsedFile, RawRow, ValidationResult, IMPORT_FIELDS,
};
use crate::importer::{
    CsvParser, HeuristicMappingInferencer, InventoryRowValidator, MappingInferencer,
    ProductImporter, ProductImporterImpl, RowValidator, TabularParser,
};
use crate::repository::{InventoryStore, SqliteInventoryStore};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

// ==========================================
// ImportApi - 导入API
// ==========================================
pub struct ImportApi<S = SqliteInventoryStore, C = ConfigManager>
where
    S: InventoryStore,
    C: ImportConfigReader,
{
    store: Arc<S>,
    config: Arc<C>,
    inferencer: HeuristicMappingInferencer,
    validator: InventoryRowValidator,
    importer: ProductImporterImpl<S, C>,
}

impl ImportApi {
    /// 打开（必要时创建）数据库并构建 ImportApi
    ///
    /// 仓储与配置共享同一连接
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = open_and_init(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        let conn = Arc::new(Mutex::new(conn));

        let store = SqliteInventoryStore::from_connection(conn.clone())?;
        let config = ConfigManager::from_connection(conn)?;

        Ok(Self::with_components(Arc::new(store), Arc::new(config)))
    }
}

impl<S, C> ImportApi<S, C>
where
    S: InventoryStore,
    C: ImportConfigReader,
{
    /// 使用外部传入的仓储与配置构建
    pub fn with_components(store: Arc<S>, config: Arc<C>) -> Self {
        Self {
            importer: ProductImporterImpl::new(store.clone(), config.clone()),
            store,
            config,
            inferencer: HeuristicMappingInferencer::default(),
            validator: InventoryRowValidator::new(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &Arc<C> {
        &self.config
    }

    async fn parser(&self) -> ApiResult<CsvParser> {
        let max_size = self.config.get_max_file_size_bytes().await?;
        Ok(CsvParser::new(max_size))
    }

    // ==========================================
    // 管道入口
    // ==========================================

    /// 读取并解析磁盘文件
    ///
    /// # 返回
    /// - Ok(ParsedFile): 表头 + 行记录
    /// - Err(ApiError::ImportError): 文件不存在/过大/格式错误/无表头/无数据
    pub async fn parse_file(&self, file_path: &str) -> ApiResult<ParsedFile> {
        let parser = self.parser().await?;
        let parsed = parser.parse_file(Path::new(file_path)).map_err(|e| {
            warn!(file_path, error = %e, "文件解析失败");
            ApiError::from(e)
        })?;
        info!(
            file_path,
            headers = parsed.headers.len(),
            rows = parsed.row_count(),
            "文件解析完成"
        );
        Ok(parsed)
    }

    /// 解析内存中的文件内容（界面层已读取字节）
    pub async fn parse_bytes(&self, file_name: &str, content: &[u8]) -> ApiResult<ParsedFile> {
        let parser = self.parser().await?;
        parser.parse_bytes(file_name, content).map_err(|e| {
            warn!(file_name, error = %e, "文件解析失败");
            ApiError::from(e)
        })
    }

    /// 固定字段表
    pub fn import_fields(&self) -> &'static [ImportField] {
        &IMPORT_FIELDS
    }

    /// 推断列映射（确定性，可重复调用）
    pub fn infer_mapping(&self, headers: &[String]) -> ColumnMapping {
        self.inferencer.infer(headers, &IMPORT_FIELDS)
    }

    /// 校验行记录
    pub fn validate(&self, rows: &[RawRow], mapping: &ColumnMapping) -> ValidationResult {
        self.validator.validate(rows, mapping)
    }

    /// 提交行记录
    ///
    /// 提交前重新校验，校验未通过时拒绝执行
    ///
    /// # 返回
    /// - Ok(CommitResult): 导入结果
    /// - Err(ApiError::ValidationError): 存在校验错误
    /// - Err: 存储层错误（本批次视为未提交）
    pub async fn commit(
        &self,
        rows: &[RawRow],
        mapping: &ColumnMapping,
    ) -> ApiResult<CommitResult> {
        let validation = self.validate(rows, mapping);
        if !validation.is_valid {
            return Err(ApiError::ValidationError(format!(
                "{} error(s) must be fixed before import",
                validation.error_count()
            )));
        }

        Ok(self.importer.commit(rows, mapping).await?)
    }

    // ==========================================
    // 附加操作
    // ==========================================

    /// 是否需要初始化（库中尚无商品）
    pub async fn is_setup_required(&self) -> ApiResult<bool> {
        Ok(self.store.count_products().await? == 0)
    }

    /// 清空商品、货位、区域、仓库
    pub async fn reset_inventory(&self) -> ApiResult<()> {
        self.store.clear_all().await?;
        info!("库存数据已重置");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportDefaults;
    use crate::db::IN_MEMORY_DB_PATH;
    use crate::domain::import::FieldKey;

    fn api() -> ImportApi<SqliteInventoryStore, ImportDefaults> {
        ImportApi::with_components(
            Arc::new(SqliteInventoryStore::in_memory().unwrap()),
            Arc::new(ImportDefaults::default()),
        )
    }

    #[tokio::test]
    async fn test_pipeline_round_trip() {
        let api = api();
        assert!(api.is_setup_required().await.unwrap());

        let parsed = api
            .parse_bytes("stock.csv", b"SKU,Name,Quantity\nX1,Widget,10\nX2,Gadget,5\n")
            .await
            .unwrap();
        let mapping = api.infer_mapping(&parsed.headers);
        assert!(mapping.required_mapped());

        let result = api.commit(&parsed.rows, &mapping).await.unwrap();
        assert_eq!(result.imported, 2);
        assert!(!api.is_setup_required().await.unwrap());

        api.reset_inventory().await.unwrap();
        assert!(api.is_setup_required().await.unwrap());
    }

    #[tokio::test]
    async fn test_commit_refused_when_invalid() {
        let api = api();
        let parsed = api
            .parse_bytes("stock.csv", b"SKU,Name,Quantity\n,Bad,oops\n")
            .await
            .unwrap();
        let mapping = api.infer_mapping(&parsed.headers);

        let err = api.commit(&parsed.rows, &mapping).await.unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
        assert_eq!(api.store().count_products().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_parse_uses_configured_size_limit() {
        let api = ImportApi::with_components(
            Arc::new(SqliteInventoryStore::in_memory().unwrap()),
            Arc::new(ImportDefaults {
                max_file_size_bytes: 4,
                ..ImportDefaults::default()
            }),
        );
        let err = api.parse_bytes("a.csv", b"SKU\nX1\n").await.unwrap_err();
        assert!(matches!(err, ApiError::ImportError(_)));
    }

    #[tokio::test]
    async fn test_new_opens_database() {
        let api = ImportApi::new(IN_MEMORY_DB_PATH).unwrap();
        assert_eq!(api.import_fields().len(), 9);
        assert_eq!(api.import_fields()[0].key, FieldKey::Sku);
        assert!(api.is_setup_required().await.unwrap());
    }
}
