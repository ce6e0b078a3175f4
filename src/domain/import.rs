// ==========================================
// Wareflow 仓储管理 - 导入领域模型
// ==========================================
// 用途: 导入管道中间产物（解析 → 映射 → 校验 → 提交）
// 生命周期: 仅在一次导入会话内，提交成功或会话重启后丢弃
// ==========================================

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ==========================================
// FieldKey - 标准字段键
// ==========================================
// 顺序即字段表顺序（派生 Ord 依赖声明顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKey {
    Sku,
    Name,
    Quantity,
    Sector,
    Zone,
    Floor,
    Description,
    Category,
    Unit,
}

impl FieldKey {
    pub const ALL: [FieldKey; 9] = [
        FieldKey::Sku,
        FieldKey::Name,
        FieldKey::Quantity,
        FieldKey::Sector,
        FieldKey::Zone,
        FieldKey::Floor,
        FieldKey::Description,
        FieldKey::Category,
        FieldKey::Unit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Sku => "sku",
            FieldKey::Name => "name",
            FieldKey::Quantity => "quantity",
            FieldKey::Sector => "sector",
            FieldKey::Zone => "zone",
            FieldKey::Floor => "floor",
            FieldKey::Description => "description",
            FieldKey::Category => "category",
            FieldKey::Unit => "unit",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("未知字段: {}", s))
    }
}

// ==========================================
// ImportField - 字段表条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportField {
    pub key: FieldKey,
    pub label: &'static str,
    pub required: bool,
    pub default_value: Option<&'static str>,
}

/// 固定字段表（9 项，有序）
///
/// 必填子集: sku / name / quantity
pub static IMPORT_FIELDS: [ImportField; 9] = [
    ImportField { key: FieldKey::Sku, label: "SKU", required: true, default_value: None },
    ImportField { key: FieldKey::Name, label: "Name", required: true, default_value: None },
    ImportField { key: FieldKey::Quantity, label: "Quantity", required: true, default_value: None },
    ImportField { key: FieldKey::Sector, label: "Sector", required: false, default_value: None },
    ImportField { key: FieldKey::Zone, label: "Zone", required: false, default_value: None },
    ImportField { key: FieldKey::Floor, label: "Floor", required: false, default_value: None },
    ImportField { key: FieldKey::Description, label: "Description", required: false, default_value: None },
    ImportField { key: FieldKey::Category, label: "Category", required: false, default_value: None },
    ImportField { key: FieldKey::Unit, label: "Unit", required: false, default_value: Some("pcs") },
];

/// 按键查找字段表条目
pub fn import_field(key: FieldKey) -> &'static ImportField {
    // IMPORT_FIELDS 与 FieldKey::ALL 同序
    &IMPORT_FIELDS[key as usize]
}

// ==========================================
// RawRow - 原始行记录
// ==========================================
// 列名 → 单元格值，保持文件列顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加单元格；同名列以首次出现为准
    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        let header = header.into();
        if self.cells.iter().any(|(h, _)| *h == header) {
            return;
        }
        self.cells.push((header, value.into()));
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    /// 缺失的列按空字符串处理
    pub fn value_or_empty(&self, header: &str) -> &str {
        self.get(header).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }
}

impl<H: Into<String>, V: Into<String>> FromIterator<(H, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (H, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (h, v) in iter {
            row.insert(h, v);
        }
        row
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (header, value) in &self.cells {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RawRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawRowVisitor;

        impl<'de> Visitor<'de> for RawRowVisitor {
            type Value = RawRow;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column header to cell value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawRow, A::Error> {
                let mut row = RawRow::new();
                while let Some((header, value)) = access.next_entry::<String, String>()? {
                    row.insert(header, value);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RawRowVisitor)
    }
}

// ==========================================
// ParsedFile - 解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub file_name: String,
    pub headers: Vec<String>, // 文件列顺序，互不相同
    pub rows: Vec<RawRow>,    // 文件行顺序
}

impl ParsedFile {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

// ==========================================
// ColumnMapping - 列映射（字段键 → 列名）
// ==========================================
// 说明: 可不完整；映射到空字符串等同于未映射
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    fields: BTreeMap<FieldKey, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取字段映射的列名（未映射或空列名返回 None）
    pub fn get(&self, key: FieldKey) -> Option<&str> {
        self.fields
            .get(&key)
            .map(String::as_str)
            .filter(|header| !header.is_empty())
    }

    pub fn set(&mut self, key: FieldKey, header: impl Into<String>) {
        self.fields.insert(key, header.into());
    }

    pub fn with(mut self, key: FieldKey, header: impl Into<String>) -> Self {
        self.set(key, header);
        self
    }

    pub fn clear(&mut self, key: FieldKey) {
        self.fields.remove(&key);
    }

    pub fn is_mapped(&self, key: FieldKey) -> bool {
        self.get(key).is_some()
    }

    pub fn mapped_count(&self) -> usize {
        self.fields.values().filter(|h| !h.is_empty()).count()
    }

    /// 未映射的必填字段（按字段表顺序）
    pub fn missing_required(&self) -> Vec<&'static ImportField> {
        IMPORT_FIELDS
            .iter()
            .filter(|field| field.required && !self.is_mapped(field.key))
            .collect()
    }

    pub fn required_mapped(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// 读取行中某字段对应的单元格（未映射时为 None）
    pub fn cell<'r>(&self, row: &'r RawRow, key: FieldKey) -> Option<&'r str> {
        self.get(key).map(|header| row.value_or_empty(header))
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        self.fields
            .iter()
            .filter(|(_, h)| !h.is_empty())
            .map(|(k, h)| (*k, h.as_str()))
    }
}

// ==========================================
// ValidationIssue / ValidationResult - 校验结果
// ==========================================
/// 校验问题（row = 0 表示映射级问题，否则为 1 起始行号）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub row: usize,
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(row: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.into(),
            message: message.into(),
        }
    }
}

/// 校验结果（is_valid ⇔ errors 为空；warnings 不影响有效性）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn from_issues(errors: Vec<ValidationIssue>, warnings: Vec<ValidationIssue>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

// ==========================================
// CommitResult - 提交结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitResult {
    pub imported: usize,
    pub batch_id: String,
    pub warehouse_id: i64,
    pub sector_id: i64,
    pub sector_name: String,
    pub warehouse_created: bool,
    pub sector_created: bool,
    pub elapsed_ms: i64,
}

// ==========================================
// ImportStep - 导入向导步骤
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportStep {
    FileSelection,
    Preview,
    ColumnMapping,
    Validation,
    Complete,
}

impl fmt::Display for ImportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImportStep::FileSelection => "file-selection",
            ImportStep::Preview => "preview",
            ImportStep::ColumnMapping => "column-mapping",
            ImportStep::Validation => "validation",
            ImportStep::Complete => "complete",
        };
        f.write_str(s)
    }
}
