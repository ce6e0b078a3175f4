// ==========================================
// Wareflow 仓储管理 - 行校验器
// ==========================================
// 阶段 2: 映射完整性 + 逐行业务规则
// 规则:
// - 必填字段未映射 → 行 0 错误，立即返回（不做逐行检查）
// - SKU 为空 → 错误；重复（区分大小写）→ 警告，首次出现不告警
// - Name 为空 → 错误
// - Quantity 为空 → 忽略；非数值 → 错误；负数 → 警告
// ==========================================

use crate::domain::import::{
    ColumnMapping, FieldKey, RawRow, ValidationIssue, ValidationResult, IMPORT_FIELDS,
};
use crate::importer::importer_trait::RowValidator;
use crate::importer::number::{format_number, parse_number};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct InventoryRowValidator;

impl InventoryRowValidator {
    pub fn new() -> Self {
        Self
    }

    /// 映射完整性检查（行号 0）
    pub fn validate_mapping(&self, mapping: &ColumnMapping) -> Vec<ValidationIssue> {
        IMPORT_FIELDS
            .iter()
            .filter(|field| field.required && !mapping.is_mapped(field.key))
            .map(|field| {
                ValidationIssue::new(
                    0,
                    field.key.as_str(),
                    format!("Required field \"{}\" is not mapped", field.label),
                )
            })
            .collect()
    }
}

impl RowValidator for InventoryRowValidator {
    fn validate(&self, rows: &[RawRow], mapping: &ColumnMapping) -> ValidationResult {
        let mapping_errors = self.validate_mapping(mapping);
        if !mapping_errors.is_empty() {
            debug!(missing = mapping_errors.len(), "必填字段未映射，跳过逐行校验");
            return ValidationResult::from_issues(mapping_errors, Vec::new());
        }

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut seen_skus: HashSet<&str> = HashSet::new();

        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;

            // SKU
            if let Some(sku) = mapping.cell(row, FieldKey::Sku) {
                if sku.trim().is_empty() {
                    errors.push(ValidationIssue::new(row_number, "sku", "SKU is required"));
                } else if !seen_skus.insert(sku) {
                    warnings.push(ValidationIssue::new(
                        row_number,
                        "sku",
                        format!("Duplicate SKU: {}", sku),
                    ));
                }
            }

            // Name
            if let Some(name) = mapping.cell(row, FieldKey::Name) {
                if name.trim().is_empty() {
                    errors.push(ValidationIssue::new(row_number, "name", "Name is required"));
                }
            }

            // Quantity
            if let Some(quantity) = mapping.cell(row, FieldKey::Quantity) {
                if !quantity.trim().is_empty() {
                    match parse_number(quantity) {
                        None => errors.push(ValidationIssue::new(
                            row_number,
                            "quantity",
                            "Invalid quantity: must be a number",
                        )),
                        Some(value) if value < 0.0 => warnings.push(ValidationIssue::new(
                            row_number,
                            "quantity",
                            format!("Negative quantity: {}", format_number(value)),
                        )),
                        Some(_) => {}
                    }
                }
            }
        }

        debug!(
            rows = rows.len(),
            errors = errors.len(),
            warnings = warnings.len(),
            "行校验完成"
        );

        ValidationResult::from_issues(errors, warnings)
    }
}
