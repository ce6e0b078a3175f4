// ==========================================
// Wareflow 仓储管理 - 库存领域模型
// ==========================================
// 用途: 导入提交阶段创建的持久化实体
// 对齐: db::init_schema 中 warehouse/sector/zone/product 表
// 约束: 实体 ID 由存储层在插入时分配
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Warehouse - 仓库
// ==========================================
// 说明: 系统只维护一个默认仓库，首次导入时惰性创建
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: i64,
    pub name: String,
    pub floors: i32, // 楼层数
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 待插入的仓库（无 ID）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWarehouse {
    pub name: String,
    pub floors: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// Sector - 区域
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub id: i64,
    pub warehouse_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSector {
    pub warehouse_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// Zone - 库位区块
// ==========================================
// 说明: 导入管道不创建 Zone，由网格编辑器维护
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: i64,
    pub sector_id: i64,
    pub name: String,
    pub floor: i32,
    pub position_x: f64,
    pub position_y: f64,
    pub width: f64,
    pub height: f64,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewZone {
    pub sector_id: i64,
    pub name: String,
    pub floor: i32,
    pub position_x: f64,
    pub position_y: f64,
    pub width: f64,
    pub height: f64,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// Product - 商品
// ==========================================
// 红线: 导入管道不做空间定位，position_x/position_y/zone_id 保持为空
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub quantity: f64,
    pub sector_id: Option<i64>,
    pub zone_id: Option<i64>,
    pub floor: i32,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 待插入的商品（由导入提交阶段构造）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub quantity: f64,
    pub sector_id: Option<i64>,
    pub zone_id: Option<i64>,
    pub floor: i32,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
