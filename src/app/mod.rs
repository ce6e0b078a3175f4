// ==========================================
// Wareflow 仓储管理 - 应用层
// ==========================================
// 职责: 连接界面层与导入API，持有共享状态
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
