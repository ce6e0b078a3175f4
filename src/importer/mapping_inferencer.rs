// ==========================================
// Wareflow 仓储管理 - 列映射推断
// ==========================================
// 阶段 1: 表头 → 字段键 的尽力推断
// 规则: 逐字段按策略顺序尝试（精确 → 部分），首个命中即采用
// 说明: 不做跨字段唯一性约束，同一列可被多个字段选中
//       空列名满足部分匹配，命中后映射为 ""，视同未映射
// ==========================================

use crate::domain::import::{ColumnMapping, ImportField};
use crate::importer::importer_trait::{HeaderMatcher, MappingInferencer};
use tracing::debug;

// ==========================================
// ExactMatch - 精确匹配
// ==========================================
// 列名（忽略大小写）等于字段标签或字段键
pub struct ExactMatch;

impl HeaderMatcher for ExactMatch {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn matches(&self, header: &str, field: &ImportField) -> bool {
        let header = header.to_lowercase();
        header == field.label.to_lowercase() || header == field.key.as_str()
    }
}

// ==========================================
// PartialMatch - 部分匹配
// ==========================================
// 列名包含字段键，或字段标签包含列名（均忽略大小写）
pub struct PartialMatch;

impl HeaderMatcher for PartialMatch {
    fn name(&self) -> &'static str {
        "partial"
    }

    fn matches(&self, header: &str, field: &ImportField) -> bool {
        let header = header.to_lowercase();
        header.contains(field.key.as_str()) || field.label.to_lowercase().contains(&header)
    }
}

// ==========================================
// HeuristicMappingInferencer
// ==========================================
pub struct HeuristicMappingInferencer {
    matchers: Vec<Box<dyn HeaderMatcher>>,
}

impl Default for HeuristicMappingInferencer {
    fn default() -> Self {
        Self::new(vec![Box::new(ExactMatch), Box::new(PartialMatch)])
    }
}

impl HeuristicMappingInferencer {
    /// 使用自定义策略列表（按优先级排列）
    pub fn new(matchers: Vec<Box<dyn HeaderMatcher>>) -> Self {
        Self { matchers }
    }
}

impl MappingInferencer for HeuristicMappingInferencer {
    fn infer(&self, headers: &[String], fields: &[ImportField]) -> ColumnMapping {
        let mut mapping = ColumnMapping::new();

        for field in fields {
            let hit = self.matchers.iter().find_map(|matcher| {
                headers
                    .iter()
                    .find(|h| matcher.matches(h, field))
                    .map(|h| (matcher.name(), h))
            });

            if let Some((strategy, header)) = hit {
                debug!(field = %field.key, header = %header, strategy, "字段映射命中");
                mapping.set(field.key, header.clone());
            }
        }

        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::{FieldKey, IMPORT_FIELDS};

    fn headers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn infer(list: &[&str]) -> ColumnMapping {
        HeuristicMappingInferencer::default().infer(&headers(list), &IMPORT_FIELDS)
    }

    #[test]
    fn test_exact_match_on_label_or_key() {
        let mapping = infer(&["SKU", "name", "QUANTITY"]);
        assert_eq!(mapping.get(FieldKey::Sku), Some("SKU"));
        assert_eq!(mapping.get(FieldKey::Name), Some("name"));
        assert_eq!(mapping.get(FieldKey::Quantity), Some("QUANTITY"));
        assert_eq!(mapping.mapped_count(), 3);
    }

    #[test]
    fn test_exact_beats_partial_regardless_of_column_order() {
        // "Product Name" 部分匹配在前，"Name" 精确匹配在后
        let mapping = infer(&["Product Name", "Name"]);
        assert_eq!(mapping.get(FieldKey::Name), Some("Name"));
    }

    #[test]
    fn test_partial_match() {
        let mapping = infer(&["Item SKU Code", "Qty", "Unit of measure"]);
        assert_eq!(mapping.get(FieldKey::Sku), Some("Item SKU Code"));
        assert_eq!(mapping.get(FieldKey::Unit), Some("Unit of measure"));
        // 标签 "Quantity" 不包含 "qty"，键也不在列名中
        assert_eq!(mapping.get(FieldKey::Quantity), None);
    }

    #[test]
    fn test_label_contains_header() {
        // "Quantity" 包含 "quant"
        let mapping = infer(&["Quant"]);
        assert_eq!(mapping.get(FieldKey::Quantity), Some("Quant"));
    }

    #[test]
    fn test_first_qualifying_header_wins() {
        let mapping = infer(&["sku_main", "sku_alt"]);
        assert_eq!(mapping.get(FieldKey::Sku), Some("sku_main"));
    }

    #[test]
    fn test_header_may_be_shared_by_fields() {
        // "Sector Zone" 同时包含 sector 与 zone
        let mapping = infer(&["Sector Zone"]);
        assert_eq!(mapping.get(FieldKey::Sector), Some("Sector Zone"));
        assert_eq!(mapping.get(FieldKey::Zone), Some("Sector Zone"));
    }

    #[test]
    fn test_empty_header_counts_as_unmapped() {
        let mapping = infer(&["", "Weight"]);
        assert_eq!(mapping.mapped_count(), 0);
    }

    #[test]
    fn test_empty_header_ahead_of_partial_candidate() {
        // 部分匹配按列顺序，空列名先命中
        let mapping = infer(&["", "Item SKU"]);
        assert_eq!(mapping.get(FieldKey::Sku), None);
        assert!(!mapping.required_mapped());

        // 精确匹配优先于空列名
        let mapping = infer(&["", "SKU"]);
        assert_eq!(mapping.get(FieldKey::Sku), Some("SKU"));

        let mapping = infer(&["Item SKU", ""]);
        assert_eq!(mapping.get(FieldKey::Sku), Some("Item SKU"));
    }

    #[test]
    fn test_deterministic() {
        let list = ["Code", "sku", "Product Name", "Stock Quantity", "Floor #"];
        assert_eq!(infer(&list), infer(&list));
    }

    #[test]
    fn test_custom_strategy_list() {
        let inferencer = HeuristicMappingInferencer::new(vec![Box::new(ExactMatch)]);
        let mapping = inferencer.infer(&headers(&["Item SKU Code"]), &IMPORT_FIELDS);
        assert!(!mapping.is_mapped(FieldKey::Sku));
    }
}
