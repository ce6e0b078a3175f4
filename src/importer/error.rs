// ==========================================
// Wareflow 仓储管理 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 文件类错误的提示文本直接面向操作员
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("File is too large. Maximum size is {limit}.")]
    FileTooLarge { size_bytes: u64, max_bytes: u64, limit: String },

    #[error("Invalid file type. Accepted: .csv (got: {0})")]
    UnsupportedFormat(String),

    #[error("Failed to read file: {0}")]
    FileReadError(String),

    #[error("File has no headers")]
    NoHeaders,

    #[error("File is empty")]
    EmptyFile,

    #[error("Parsing error: {0}")]
    CsvParseError(String),

    // ===== 数据库错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 构造文件过大错误
    pub fn file_too_large(size_bytes: u64, max_bytes: u64) -> Self {
        ImportError::FileTooLarge {
            size_bytes,
            max_bytes,
            limit: format_size_limit(max_bytes),
        }
    }

    /// 是否为输入类错误（用户换文件重试即可）
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ImportError::FileNotFound(_)
                | ImportError::FileTooLarge { .. }
                | ImportError::UnsupportedFormat(_)
                | ImportError::FileReadError(_)
                | ImportError::NoHeaders
                | ImportError::EmptyFile
                | ImportError::CsvParseError(_)
        )
    }
}

/// 上限展示：不足 1 MiB 时退回 KB，不足 1 KiB 时显示字节数（向下取整）
fn format_size_limit(max_bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;

    if max_bytes >= MIB {
        format!("{} MB", max_bytes / MIB)
    } else if max_bytes >= KIB {
        format!("{} KB", max_bytes / KIB)
    } else {
        format!("{} bytes", max_bytes)
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Repository(RepositoryError::from(err))
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
