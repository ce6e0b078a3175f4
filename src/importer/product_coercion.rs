// ==========================================
// Wareflow 仓储管理 - 行 → 商品字段转换
// ==========================================
// 纯函数，不访问存储
// 缺省规则:
// - sku/name 未映射 → 空字符串
// - quantity/floor 缺失或非数值 → 0（floor 截断为整数）
// - description/category 为空 → None
// - unit 为空 → 默认单位
// ==========================================

use crate::config::import_config_trait::ImportDefaults;
use crate::domain::import::{ColumnMapping, FieldKey, RawRow};
use crate::domain::inventory::NewProduct;
use crate::importer::number::parse_number;
use chrono::{DateTime, Utc};

/// 单行转换后的商品字段（尚未关联区域）
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub sku: String,
    pub name: String,
    pub quantity: f64,
    pub floor: i32,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: String,
}

impl ProductFields {
    /// 补齐区域引用与时间戳，位置与货位保持为空
    pub fn into_new_product(self, sector_id: i64, now: DateTime<Utc>) -> NewProduct {
        NewProduct {
            sku: self.sku,
            name: self.name,
            quantity: self.quantity,
            sector_id: Some(sector_id),
            zone_id: None,
            floor: self.floor,
            position_x: None,
            position_y: None,
            description: self.description,
            category: self.category,
            unit: self.unit,
            created_at: now,
            updated_at: now,
        }
    }
}

pub fn coerce_row(row: &RawRow, mapping: &ColumnMapping, defaults: &ImportDefaults) -> ProductFields {
    let text = |key: FieldKey| mapping.cell(row, key).unwrap_or("").to_string();
    let optional = |key: FieldKey| {
        mapping
            .cell(row, key)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let number = |key: FieldKey| {
        mapping
            .cell(row, key)
            .and_then(parse_number)
            .unwrap_or(0.0)
    };

    ProductFields {
        sku: text(FieldKey::Sku),
        name: text(FieldKey::Name),
        quantity: number(FieldKey::Quantity),
        floor: number(FieldKey::Floor).trunc() as i32,
        description: optional(FieldKey::Description),
        category: optional(FieldKey::Category),
        unit: optional(FieldKey::Unit).unwrap_or_else(|| defaults.unit.clone()),
    }
}

/// 区域名称取自首行的 sector 列（原样使用，不做修剪），未映射或为空串时使用默认区域名
pub fn resolve_sector_name(
    rows: &[RawRow],
    mapping: &ColumnMapping,
    defaults: &ImportDefaults,
) -> String {
    rows.first()
        .and_then(|row| mapping.cell(row, FieldKey::Sector))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| defaults.sector_name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_coerce_full_row() {
        let mapping = ColumnMapping::new()
            .with(FieldKey::Sku, "SKU")
            .with(FieldKey::Name, "Name")
            .with(FieldKey::Quantity, "Qty")
            .with(FieldKey::Floor, "Floor")
            .with(FieldKey::Description, "Desc")
            .with(FieldKey::Category, "Cat")
            .with(FieldKey::Unit, "Unit");
        let r = row(&[
            ("SKU", "X1"),
            ("Name", "Widget"),
            ("Qty", "12.5"),
            ("Floor", "3.9"),
            ("Desc", "Blue"),
            ("Cat", ""),
            ("Unit", "box"),
        ]);

        let fields = coerce_row(&r, &mapping, &ImportDefaults::default());

        assert_eq!(fields.sku, "X1");
        assert_eq!(fields.quantity, 12.5);
        assert_eq!(fields.floor, 3);
        assert_eq!(fields.description.as_deref(), Some("Blue"));
        assert_eq!(fields.category, None);
        assert_eq!(fields.unit, "box");
    }

    #[test]
    fn test_coerce_defaults() {
        let mapping = ColumnMapping::new()
            .with(FieldKey::Sku, "SKU")
            .with(FieldKey::Quantity, "Qty");
        let r = row(&[("SKU", "X1"), ("Qty", "oops")]);

        let fields = coerce_row(&r, &mapping, &ImportDefaults::default());

        assert_eq!(fields.name, "");
        assert_eq!(fields.quantity, 0.0);
        assert_eq!(fields.floor, 0);
        assert_eq!(fields.unit, "pcs");
    }

    #[test]
    fn test_into_new_product_leaves_placement_unset() {
        let fields = ProductFields {
            sku: "X1".to_string(),
            name: "Widget".to_string(),
            quantity: 1.0,
            floor: 0,
            description: None,
            category: None,
            unit: "pcs".to_string(),
        };
        let now = Utc::now();
        let product = fields.into_new_product(7, now);

        assert_eq!(product.sector_id, Some(7));
        assert_eq!(product.zone_id, None);
        assert_eq!(product.position_x, None);
        assert_eq!(product.created_at, now);
        assert_eq!(product.updated_at, now);
    }

    #[test]
    fn test_resolve_sector_name() {
        let defaults = ImportDefaults::default();
        let mapped = ColumnMapping::new().with(FieldKey::Sector, "Sector");
        let rows = vec![row(&[("Sector", "Cold Room")]), row(&[("Sector", "Dry")])];

        assert_eq!(resolve_sector_name(&rows, &mapped, &defaults), "Cold Room");
        assert_eq!(resolve_sector_name(&rows, &ColumnMapping::new(), &defaults), "Default");

        let blank_first = vec![row(&[("Sector", "")]), row(&[("Sector", "Dry")])];
        assert_eq!(resolve_sector_name(&blank_first, &mapped, &defaults), "Default");
        assert_eq!(resolve_sector_name(&[], &mapped, &defaults), "Default");
    }

    #[test]
    fn test_sector_name_taken_verbatim() {
        let defaults = ImportDefaults::default();
        let mapped = ColumnMapping::new().with(FieldKey::Sector, "Sector");

        let padded = vec![row(&[("Sector", " Cold ")])];
        assert_eq!(resolve_sector_name(&padded, &mapped, &defaults), " Cold ");

        let spaces = vec![row(&[("Sector", "  ")])];
        assert_eq!(resolve_sector_name(&spaces, &mapped, &defaults), "  ");
    }
}
