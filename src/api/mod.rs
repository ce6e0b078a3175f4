// ==========================================
// Wareflow 仓储管理 - API 层
// ==========================================
// 职责: 提供导入管道的调用入口与向导会话，供界面层调用
// ==========================================

pub mod error;
pub mod import_api;
pub mod import_session;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::ImportApi;
pub use import_session::ImportSession;
