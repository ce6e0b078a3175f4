// ==========================================
// Wareflow 仓储管理 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: CSV (.csv, UTF-8, 可带 BOM)
// ==========================================

use crate::config::import_config_trait::DEFAULT_MAX_FILE_SIZE_BYTES;
use crate::domain::import::{ParsedFile, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::TabularParser;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

const SUPPORTED_EXTENSION: &str = "csv";
const UTF8_BOM: &str = "\u{feff}";

// ==========================================
// CSV Parser 实现
// ==========================================
#[derive(Debug, Clone)]
pub struct CsvParser {
    max_file_size_bytes: u64,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE_BYTES)
    }
}

impl CsvParser {
    pub fn new(max_file_size_bytes: u64) -> Self {
        Self { max_file_size_bytes }
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_bytes
    }

    /// 从磁盘读取并解析
    ///
    /// 存在性、大小、扩展名均在读取内容之前检查
    pub fn parse_file(&self, file_path: &Path) -> ImportResult<ParsedFile> {
        // 检查文件存在
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let size = fs::metadata(file_path)?.len();
        self.check_size(size)?;

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.display().to_string());
        check_extension(&file_name)?;

        let content = fs::read(file_path)?;
        self.parse_bytes(&file_name, &content)
    }

    fn check_size(&self, size_bytes: u64) -> ImportResult<()> {
        if size_bytes > self.max_file_size_bytes {
            return Err(ImportError::file_too_large(size_bytes, self.max_file_size_bytes));
        }
        Ok(())
    }
}

impl TabularParser for CsvParser {
    fn parse_bytes(&self, file_name: &str, content: &[u8]) -> ImportResult<ParsedFile> {
        self.check_size(content.len() as u64)?;
        check_extension(file_name)?;

        let text = std::str::from_utf8(content)
            .map_err(|e| ImportError::CsvParseError(format!("invalid UTF-8: {}", e)))?;
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致，由下方统一处理
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let mut headers: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for result in reader.records() {
            let record = result?;
            let cells = clean_cells(&record);

            // 仅跳过真正的空行（单个空单元格），",," 这类仅含分隔符的行保留为数据行
            if is_blank_line(&cells) {
                continue;
            }

            // 首个非空行为表头
            if headers.is_none() {
                headers = Some(dedupe_headers(cells));
                continue;
            }
            let headers: &[String] = headers.as_deref().unwrap_or_default();

            let row_number = rows.len() + 1;
            if cells.len() > headers.len() {
                return Err(ImportError::CsvParseError(format!(
                    "Too many fields: expected {} fields but parsed {} (row {})",
                    headers.len(),
                    cells.len(),
                    row_number
                )));
            }

            let mut row = RawRow::new();
            let mut values = cells.into_iter();
            for header in headers {
                row.insert(header.clone(), values.next().unwrap_or_default());
            }
            rows.push(row);
        }

        let headers = headers.ok_or(ImportError::NoHeaders)?;
        if rows.is_empty() {
            return Err(ImportError::EmptyFile);
        }

        debug!(
            file_name,
            header_count = headers.len(),
            row_count = rows.len(),
            "CSV 解析完成"
        );

        Ok(ParsedFile {
            file_name: file_name.to_string(),
            headers,
            rows,
        })
    }
}

/// 扩展名检查（大小写不敏感）
fn check_extension(file_name: &str) -> ImportResult<()> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    if ext.eq_ignore_ascii_case(SUPPORTED_EXTENSION) {
        Ok(())
    } else {
        Err(ImportError::UnsupportedFormat(if ext.is_empty() {
            file_name.to_string()
        } else {
            format!(".{}", ext)
        }))
    }
}

fn is_blank_line(cells: &[String]) -> bool {
    matches!(cells, [] | [_]) && cells.iter().all(|c| c.is_empty())
}

fn clean_cells(record: &StringRecord) -> Vec<String> {
    record.iter().map(strip_quotes).collect()
}

/// 去除一层包裹引号（csv 未识别的 ' 或带前导空白的 "）
fn strip_quotes(cell: &str) -> String {
    let cell = cell.trim();
    for quote in ['"', '\''] {
        if cell.len() >= 2 && cell.starts_with(quote) && cell.ends_with(quote) {
            return cell[1..cell.len() - 1].trim().to_string();
        }
    }
    cell.to_string()
}

/// 重名列追加 _1、_2 … 后缀
fn dedupe_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());

    for header in raw {
        let mut candidate = header.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}_{}", header, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());
        headers.push(candidate);
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn parse(content: &str) -> ImportResult<ParsedFile> {
        CsvParser::default().parse_bytes("inventory.csv", content.as_bytes())
    }

    #[test]
    fn test_csv_parser_valid_content() {
        let parsed = parse("SKU,Name,Quantity\nX1,Widget,10\nX2,Gadget,-3\n").unwrap();

        assert_eq!(parsed.headers, vec!["SKU", "Name", "Quantity"]);
        assert_eq!(parsed.row_count(), 2);
        assert_eq!(parsed.rows[0].get("SKU"), Some("X1"));
        assert_eq!(parsed.rows[1].get("Quantity"), Some("-3"));
        assert_eq!(parsed.file_name, "inventory.csv");
    }

    #[test]
    fn test_quoted_delimiter_is_one_cell() {
        let parsed = parse("SKU,Description\nX1,\"Bolt, M6\"\n").unwrap();
        assert_eq!(parsed.rows[0].get("Description"), Some("Bolt, M6"));
    }

    #[test]
    fn test_trims_whitespace_and_single_quotes() {
        let parsed = parse(" SKU , 'Name' \n  X1 ,  'Widget'  \n").unwrap();
        assert_eq!(parsed.headers, vec!["SKU", "Name"]);
        assert_eq!(parsed.rows[0].get("Name"), Some("Widget"));
    }

    #[test]
    fn test_short_row_is_padded() {
        let parsed = parse("SKU,Name,Quantity\nX1\n").unwrap();
        assert_eq!(parsed.rows[0].get("Name"), Some(""));
        assert_eq!(parsed.rows[0].get("Quantity"), Some(""));
        assert_eq!(parsed.rows[0].len(), 3);
    }

    #[test]
    fn test_long_row_is_structural_error() {
        let err = parse("SKU,Name\nX1,Widget,extra\n").unwrap_err();
        match err {
            ImportError::CsvParseError(msg) => assert!(msg.starts_with("Too many fields")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_skips_blank_lines_and_bom() {
        let parsed = parse("\u{feff}\n   \nSKU,Name\n\n  \nX1,Widget\n").unwrap();
        assert_eq!(parsed.headers, vec!["SKU", "Name"]);
        assert_eq!(parsed.row_count(), 1);
    }

    #[test]
    fn test_delimiter_only_line_is_a_row() {
        let parsed = parse("SKU,Name,Quantity\nX1,Widget,10\n,,\nX3,Thing,oops\n").unwrap();
        assert_eq!(parsed.row_count(), 3);
        assert_eq!(parsed.rows[1].get("SKU"), Some(""));
        assert_eq!(parsed.rows[1].get("Name"), Some(""));
        assert_eq!(parsed.rows[2].get("SKU"), Some("X3"));
    }

    #[test]
    fn test_duplicate_headers_get_suffix() {
        let parsed = parse("SKU,SKU,Name,SKU\nA,B,C,D\n").unwrap();
        assert_eq!(parsed.headers, vec!["SKU", "SKU_1", "Name", "SKU_2"]);
        assert_eq!(parsed.rows[0].get("SKU_1"), Some("B"));
    }

    #[test]
    fn test_missing_header_slot_kept_as_empty() {
        let parsed = parse("SKU,,Name\nX1,ignored,Widget\n").unwrap();
        assert_eq!(parsed.headers, vec!["SKU", "", "Name"]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(matches!(parse(""), Err(ImportError::NoHeaders)));
        assert!(matches!(parse(" \n\n"), Err(ImportError::NoHeaders)));
        assert!(matches!(parse("SKU,Name\n"), Err(ImportError::EmptyFile)));
    }

    #[test]
    fn test_rejects_extension_and_size() {
        let parser = CsvParser::new(8);

        let err = parser.parse_bytes("stock.xlsx", b"a").unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(ref ext) if ext == ".xlsx"));

        // 大小检查优先于扩展名检查
        let err = parser.parse_bytes("stock.xlsx", b"0123456789").unwrap_err();
        assert!(matches!(err, ImportError::FileTooLarge { size_bytes: 10, .. }));

        assert!(parser.parse_bytes("STOCK.CSV", b"a\n1\n").is_ok());
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let err = CsvParser::default()
            .parse_bytes("x.csv", &[0x53, 0x4b, 0x55, 0x0a, 0xff, 0xfe])
            .unwrap_err();
        assert!(matches!(err, ImportError::CsvParseError(_)));
    }

    #[test]
    fn test_parse_file_from_disk() {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(temp_file, "SKU,Name,Quantity").unwrap();
        writeln!(temp_file, "X1,Widget,10").unwrap();

        let parsed = CsvParser::default().parse_file(temp_file.path()).unwrap();
        assert_eq!(parsed.row_count(), 1);
    }

    #[test]
    fn test_parse_file_not_found() {
        let result = CsvParser::default().parse_file(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }
}
