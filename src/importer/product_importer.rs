// ==========================================
// Wareflow 仓储管理 - 商品导入提交器实现
// ==========================================
// 阶段 3: 提交（唯一有副作用的阶段）
// 流程: 解析仓库 → 解析区域 → 行转换 → 批量落库（事务化）
// 说明: 存储层错误原样上抛，不重试、不逐行回滚
// ==========================================

use crate::config::ImportConfigReader;
use crate::config::ImportDefaults;
use crate::domain::import::{ColumnMapping, CommitResult, RawRow};
use crate::domain::inventory::{NewProduct, NewSector, NewWarehouse, Sector, Warehouse};
use crate::importer::error::ImportResult;
use crate::importer::importer_trait::ProductImporter;
use crate::importer::product_coercion::{coerce_row, resolve_sector_name};
use crate::repository::InventoryStore;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, Span};
use uuid::Uuid;

// ==========================================
// ProductImporterImpl - 商品导入提交器
// ==========================================
pub struct ProductImporterImpl<S, C>
where
    S: InventoryStore,
    C: ImportConfigReader,
{
    // 数据访问层
    store: Arc<S>,

    // 配置读取器
    config: Arc<C>,
}

impl<S, C> ProductImporterImpl<S, C>
where
    S: InventoryStore,
    C: ImportConfigReader,
{
    /// 创建新的 ProductImporter 实例
    ///
    /// # 参数
    /// - store: 库存数据仓储（显式传入，测试可注入内存库）
    /// - config: 配置读取器
    pub fn new(store: Arc<S>, config: Arc<C>) -> Self {
        Self { store, config }
    }

    /// 取第一个仓库，不存在时按默认配置创建
    ///
    /// # 返回
    /// - (Warehouse, 是否新建)
    async fn resolve_warehouse(&self, defaults: &ImportDefaults) -> ImportResult<(Warehouse, bool)> {
        if let Some(warehouse) = self.store.first_warehouse().await? {
            return Ok((warehouse, false));
        }

        let now = Utc::now();
        let warehouse = self
            .store
            .insert_warehouse(NewWarehouse {
                name: defaults.warehouse_name.clone(),
                floors: defaults.warehouse_floors,
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(warehouse_id = warehouse.id, name = %warehouse.name, "已创建默认仓库");
        Ok((warehouse, true))
    }

    /// 按名称查找区域，不存在时在指定仓库下创建
    ///
    /// 说明: 查找与创建之间无锁，多会话并发时可能产生重名区域
    async fn resolve_sector(&self, name: &str, warehouse_id: i64) -> ImportResult<(Sector, bool)> {
        if let Some(sector) = self.store.find_sector_by_name(name).await? {
            return Ok((sector, false));
        }

        let now = Utc::now();
        let sector = self
            .store
            .insert_sector(NewSector {
                warehouse_id,
                name: name.to_string(),
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(sector_id = sector.id, name = %sector.name, "已创建区域");
        Ok((sector, true))
    }
}

#[async_trait]
impl<S, C> ProductImporter for ProductImporterImpl<S, C>
where
    S: InventoryStore,
    C: ImportConfigReader,
{
    #[instrument(skip(self, rows, mapping), fields(batch_id, row_count = rows.len()))]
    async fn commit(
        &self,
        rows: &[RawRow],
        mapping: &ColumnMapping,
    ) -> ImportResult<CommitResult> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, "开始提交导入");

        let defaults = self.config.load_import_defaults().await?;

        // 1. 仓库
        let (warehouse, warehouse_created) = self.resolve_warehouse(&defaults).await?;

        // 2. 区域（取首行）
        let sector_name = resolve_sector_name(rows, mapping, &defaults);
        let (sector, sector_created) = self.resolve_sector(&sector_name, warehouse.id).await?;

        // 3. 行转换
        let now = Utc::now();
        let products: Vec<NewProduct> = rows
            .iter()
            .map(|row| coerce_row(row, mapping, &defaults).into_new_product(sector.id, now))
            .collect();

        // 4. 批量落库
        let imported = match self.store.bulk_insert_products(products).await {
            Ok(count) => count,
            Err(e) => {
                error!(batch_id = %batch_id, error = %e, "商品批量写入失败，本批次未提交任何行");
                return Err(e.into());
            }
        };

        let elapsed = start_time.elapsed();
        info!(
            batch_id = %batch_id,
            imported,
            sector = %sector.name,
            elapsed_ms = elapsed.as_millis() as u64,
            "导入提交完成"
        );

        Ok(CommitResult {
            imported,
            batch_id,
            warehouse_id: warehouse.id,
            sector_id: sector.id,
            sector_name: sector.name,
            warehouse_created,
            sector_created,
            elapsed_ms: elapsed.as_millis() as i64,
        })
    }
}
