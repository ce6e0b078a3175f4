// ==========================================
// Wareflow 仓储管理 - 库存 Repository Trait
// ==========================================
// 职责: 定义导入提交所需的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::inventory::{
    NewProduct, NewSector, NewWarehouse, NewZone, Product, Sector, Warehouse, Zone,
};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// InventoryStore Trait
// ==========================================
// 用途: 仓库/区域/库位/商品四张表的数据访问
// 实现者: SqliteInventoryStore（使用 rusqlite）
#[async_trait]
pub trait InventoryStore: Send + Sync {
    // ===== 仓库 =====

    /// 查询第一个仓库（按 ID 升序）
    ///
    /// # 返回
    /// - Ok(Some(Warehouse)): 存在仓库
    /// - Ok(None): 仓库表为空
    async fn first_warehouse(&self) -> RepositoryResult<Option<Warehouse>>;

    /// 插入仓库，返回带存储分配 ID 的实体
    async fn insert_warehouse(&self, warehouse: NewWarehouse) -> RepositoryResult<Warehouse>;

    // ===== 区域 =====

    /// 按名称精确查找区域（区分大小写，多条时取 ID 最小者）
    async fn find_sector_by_name(&self, name: &str) -> RepositoryResult<Option<Sector>>;

    /// 插入区域
    async fn insert_sector(&self, sector: NewSector) -> RepositoryResult<Sector>;

    /// 统计区域数量
    async fn count_sectors(&self) -> RepositoryResult<usize>;

    // ===== 库位区块 =====

    /// 按名称精确查找库位区块
    async fn find_zone_by_name(&self, name: &str) -> RepositoryResult<Option<Zone>>;

    /// 插入库位区块
    async fn insert_zone(&self, zone: NewZone) -> RepositoryResult<Zone>;

    /// 批量插入库位区块（事务化，全部成功或全部回滚）
    async fn bulk_insert_zones(&self, zones: Vec<NewZone>) -> RepositoryResult<usize>;

    // ===== 商品 =====

    /// 批量插入商品（事务化，全部成功或全部回滚）
    ///
    /// # 返回
    /// - Ok(usize): 插入的记录数
    /// - Err: 数据库错误（整个事务回滚，未插入任何记录）
    async fn bulk_insert_products(&self, products: Vec<NewProduct>) -> RepositoryResult<usize>;

    /// 统计商品数量
    async fn count_products(&self) -> RepositoryResult<usize>;

    /// 按区域列出商品（按 ID 升序）
    async fn list_products_by_sector(&self, sector_id: i64) -> RepositoryResult<Vec<Product>>;

    /// 按 SKU 列出商品（SKU 未做唯一约束，可能返回多条）
    async fn find_products_by_sku(&self, sku: &str) -> RepositoryResult<Vec<Product>>;

    // ===== 重置 =====

    /// 清空商品/库位/区域/仓库四张表（按依赖顺序）
    async fn clear_all(&self) -> RepositoryResult<()>;
}
