// ==========================================
// Wareflow 仓储管理 - 库存 Repository 实现
// ==========================================
// 职责: 实现库存数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema, open_and_init, IN_MEMORY_DB_PATH};
use crate::domain::inventory::{
    NewProduct, NewSector, NewWarehouse, NewZone, Product, Sector, Warehouse, Zone,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::inventory_repo::InventoryStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};

/// 时间戳统一以 RFC 3339 文本落库
fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn parse_ts(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_warehouse(row: &Row) -> rusqlite::Result<Warehouse> {
    Ok(Warehouse {
        id: row.get(0)?,
        name: row.get(1)?,
        floors: row.get(2)?,
        created_at: parse_ts(row, 3)?,
        updated_at: parse_ts(row, 4)?,
    })
}

fn map_sector(row: &Row) -> rusqlite::Result<Sector> {
    Ok(Sector {
        id: row.get(0)?,
        warehouse_id: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_ts(row, 3)?,
        updated_at: parse_ts(row, 4)?,
    })
}

fn map_zone(row: &Row) -> rusqlite::Result<Zone> {
    Ok(Zone {
        id: row.get(0)?,
        sector_id: row.get(1)?,
        name: row.get(2)?,
        floor: row.get(3)?,
        position_x: row.get(4)?,
        position_y: row.get(5)?,
        width: row.get(6)?,
        height: row.get(7)?,
        color: row.get(8)?,
        created_at: parse_ts(row, 9)?,
        updated_at: parse_ts(row, 10)?,
    })
}

fn map_product(row: &Row) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        sku: row.get(1)?,
        name: row.get(2)?,
        quantity: row.get(3)?,
        sector_id: row.get(4)?,
        zone_id: row.get(5)?,
        floor: row.get(6)?,
        position_x: row.get(7)?,
        position_y: row.get(8)?,
        description: row.get(9)?,
        category: row.get(10)?,
        unit: row.get(11)?,
        created_at: parse_ts(row, 12)?,
        updated_at: parse_ts(row, 13)?,
    })
}

const WAREHOUSE_COLUMNS: &str = "id, name, floors, created_at, updated_at";
const SECTOR_COLUMNS: &str = "id, warehouse_id, name, created_at, updated_at";
const ZONE_COLUMNS: &str = "id, sector_id, name, floor, position_x, position_y, width, height, color, created_at, updated_at";
const PRODUCT_COLUMNS: &str = "id, sku, name, quantity, sector_id, zone_id, floor, position_x, position_y, description, category, unit, created_at, updated_at";

// ==========================================
// SqliteInventoryStore
// ==========================================
pub struct SqliteInventoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteInventoryStore {
    /// 创建新的 Store 实例（自动初始化 schema）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（":memory:" 为独立内存库）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_and_init(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 创建独立的内存库 Store
    pub fn in_memory() -> RepositoryResult<Self> {
        Self::new(IN_MEMORY_DB_PATH)
    }

    /// 从已有连接创建 Store
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA 与 schema（幂等）。
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

    /// 共享底层连接（供配置管理器等复用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中批量插入商品
    fn bulk_insert_products_tx(tx: &Transaction, products: &[NewProduct]) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO product (
                sku, name, quantity, sector_id, zone_id, floor,
                position_x, position_y, description, category, unit,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )?;

        let mut count = 0;
        for product in products {
            stmt.execute(params![
                product.sku,
                product.name,
                product.quantity,
                product.sector_id,
                product.zone_id,
                product.floor,
                product.position_x,
                product.position_y,
                product.description,
                product.category,
                product.unit,
                format_ts(&product.created_at),
                format_ts(&product.updated_at),
            ])?;
            count += 1;
        }

        Ok(count)
    }

    /// 在事务中批量插入库位区块
    fn bulk_insert_zones_tx(tx: &Transaction, zones: &[NewZone]) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO zone (
                sector_id, name, floor, position_x, position_y, width, height,
                color, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )?;

        let mut count = 0;
        for zone in zones {
            stmt.execute(params![
                zone.sector_id,
                zone.name,
                zone.floor,
                zone.position_x,
                zone.position_y,
                zone.width,
                zone.height,
                zone.color,
                format_ts(&zone.created_at),
                format_ts(&zone.updated_at),
            ])?;
            count += 1;
        }

        Ok(count)
    }
}

#[async_trait]
impl InventoryStore for SqliteInventoryStore {
    async fn first_warehouse(&self) -> RepositoryResult<Option<Warehouse>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM warehouse ORDER BY id ASC LIMIT 1", WAREHOUSE_COLUMNS);
        let warehouse = conn.query_row(&sql, [], map_warehouse).optional()?;
        Ok(warehouse)
    }

    async fn insert_warehouse(&self, warehouse: NewWarehouse) -> RepositoryResult<Warehouse> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO warehouse (name, floors, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                warehouse.name,
                warehouse.floors,
                format_ts(&warehouse.created_at),
                format_ts(&warehouse.updated_at),
            ],
        )?;

        Ok(Warehouse {
            id: conn.last_insert_rowid(),
            name: warehouse.name,
            floors: warehouse.floors,
            created_at: warehouse.created_at,
            updated_at: warehouse.updated_at,
        })
    }

    async fn find_sector_by_name(&self, name: &str) -> RepositoryResult<Option<Sector>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM sector WHERE name = ?1 ORDER BY id ASC LIMIT 1",
            SECTOR_COLUMNS
        );
        let sector = conn.query_row(&sql, params![name], map_sector).optional()?;
        Ok(sector)
    }

    async fn insert_sector(&self, sector: NewSector) -> RepositoryResult<Sector> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO sector (warehouse_id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                sector.warehouse_id,
                sector.name,
                format_ts(&sector.created_at),
                format_ts(&sector.updated_at),
            ],
        )?;

        Ok(Sector {
            id: conn.last_insert_rowid(),
            warehouse_id: sector.warehouse_id,
            name: sector.name,
            created_at: sector.created_at,
            updated_at: sector.updated_at,
        })
    }

    async fn count_sectors(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sector", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn find_zone_by_name(&self, name: &str) -> RepositoryResult<Option<Zone>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM zone WHERE name = ?1 ORDER BY id ASC LIMIT 1",
            ZONE_COLUMNS
        );
        let zone = conn.query_row(&sql, params![name], map_zone).optional()?;
        Ok(zone)
    }

    async fn insert_zone(&self, zone: NewZone) -> RepositoryResult<Zone> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        Self::bulk_insert_zones_tx(&tx, std::slice::from_ref(&zone))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Zone {
            id,
            sector_id: zone.sector_id,
            name: zone.name,
            floor: zone.floor,
            position_x: zone.position_x,
            position_y: zone.position_y,
            width: zone.width,
            height: zone.height,
            color: zone.color,
            created_at: zone.created_at,
            updated_at: zone.updated_at,
        })
    }

    async fn bulk_insert_zones(&self, zones: Vec<NewZone>) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let count = Self::bulk_insert_zones_tx(&tx, &zones)?;

        tx.commit()?;
        Ok(count)
    }

    async fn bulk_insert_products(&self, products: Vec<NewProduct>) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        // 任一行失败时 tx 被 drop，整批回滚
        let count = Self::bulk_insert_products_tx(&tx, &products)?;

        tx.commit()?;
        Ok(count)
    }

    async fn count_products(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM product", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn list_products_by_sector(&self, sector_id: i64) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM product WHERE sector_id = ?1 ORDER BY id ASC",
            PRODUCT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map(params![sector_id], map_product)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    async fn find_products_by_sku(&self, sku: &str) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM product WHERE sku = ?1 ORDER BY id ASC",
            PRODUCT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map(params![sku], map_product)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    async fn clear_all(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM product", [])?;
        tx.execute("DELETE FROM zone", [])?;
        tx.execute("DELETE FROM sector", [])?;
        tx.execute("DELETE FROM warehouse", [])?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_warehouse() -> NewWarehouse {
        let now = Utc::now();
        NewWarehouse {
            name: "Main Warehouse".to_string(),
            floors: 6,
            created_at: now,
            updated_at: now,
        }
    }

    fn new_product(sku: &str, sector_id: Option<i64>) -> NewProduct {
        let now = Utc::now();
        NewProduct {
            sku: sku.to_string(),
            name: format!("Item {}", sku),
            quantity: 1.0,
            sector_id,
            zone_id: None,
            floor: 0,
            position_x: None,
            position_y: None,
            description: None,
            category: None,
            unit: "pcs".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_warehouse_insert_and_first() {
        let store = SqliteInventoryStore::in_memory().unwrap();
        assert!(store.first_warehouse().await.unwrap().is_none());

        let created = store.insert_warehouse(new_warehouse()).await.unwrap();
        let second = store.insert_warehouse(new_warehouse()).await.unwrap();
        assert!(second.id > created.id);

        let first = store.first_warehouse().await.unwrap().unwrap();
        assert_eq!(first.id, created.id);
        assert_eq!(first.floors, 6);
    }

    #[tokio::test]
    async fn test_sector_lookup_is_exact() {
        let store = SqliteInventoryStore::in_memory().unwrap();
        let warehouse = store.insert_warehouse(new_warehouse()).await.unwrap();
        let now = Utc::now();
        store
            .insert_sector(NewSector {
                warehouse_id: warehouse.id,
                name: "Cold Storage".to_string(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        assert!(store.find_sector_by_name("Cold Storage").await.unwrap().is_some());
        assert!(store.find_sector_by_name("cold storage").await.unwrap().is_none());
        assert_eq!(store.count_sectors().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bulk_insert_products_is_atomic() {
        let store = SqliteInventoryStore::in_memory().unwrap();

        // 第二行引用不存在的区域，整批应回滚
        let products = vec![new_product("A", None), new_product("B", Some(404))];
        let result = store.bulk_insert_products(products).await;

        assert!(matches!(result, Err(RepositoryError::ForeignKeyViolation(_))));
        assert_eq!(store.count_products().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_zone_roundtrip_and_clear_all() {
        let store = SqliteInventoryStore::in_memory().unwrap();
        let warehouse = store.insert_warehouse(new_warehouse()).await.unwrap();
        let now = Utc::now();
        let sector = store
            .insert_sector(NewSector {
                warehouse_id: warehouse.id,
                name: "Default".to_string(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let zone = store
            .insert_zone(NewZone {
                sector_id: sector.id,
                name: "Z1".to_string(),
                floor: 1,
                position_x: 0.0,
                position_y: 0.0,
                width: 2.0,
                height: 3.0,
                color: Some("#ff0000".to_string()),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        let found = store.find_zone_by_name("Z1").await.unwrap().unwrap();
        assert_eq!(found.id, zone.id);
        assert_eq!(found.color.as_deref(), Some("#ff0000"));

        store
            .bulk_insert_products(vec![new_product("A", Some(sector.id))])
            .await
            .unwrap();
        assert_eq!(store.list_products_by_sector(sector.id).await.unwrap().len(), 1);

        store.clear_all().await.unwrap();
        assert_eq!(store.count_products().await.unwrap(), 0);
        assert_eq!(store.count_sectors().await.unwrap(), 0);
        assert!(store.first_warehouse().await.unwrap().is_none());
        assert!(store.find_zone_by_name("Z1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bulk_insert_zones() {
        let store = SqliteInventoryStore::in_memory().unwrap();
        let warehouse = store.insert_warehouse(new_warehouse()).await.unwrap();
        let now = Utc::now();
        let sector = store
            .insert_sector(NewSector {
                warehouse_id: warehouse.id,
                name: "Default".to_string(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let zone = |name: &str, sector_id: i64| NewZone {
            sector_id,
            name: name.to_string(),
            floor: 0,
            position_x: 1.0,
            position_y: 2.0,
            width: 4.0,
            height: 4.0,
            color: None,
            created_at: now,
            updated_at: now,
        };

        let count = store
            .bulk_insert_zones(vec![zone("A1", sector.id), zone("A2", sector.id)])
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(store.find_zone_by_name("A2").await.unwrap().unwrap().sector_id, sector.id);

        // 引用不存在的区域时整批回滚
        let result = store
            .bulk_insert_zones(vec![zone("B1", sector.id), zone("B2", 404)])
            .await;
        assert!(matches!(result, Err(RepositoryError::ForeignKeyViolation(_))));
        assert!(store.find_zone_by_name("B1").await.unwrap().is_none());
    }
}
