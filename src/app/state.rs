// ==========================================
// Wareflow 仓储管理 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::{ApiError, ApiResult, ImportApi, ImportSession};
use crate::domain::import::CommitResult;

/// 应用状态
///
/// 界面层持有的全局状态：导入API + 当前向导会话
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 导入API
    pub import_api: Arc<ImportApi>,

    /// 当前导入向导会话
    pub session: Arc<Mutex<ImportSession>>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: String) -> ApiResult<Self> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let import_api = Arc::new(ImportApi::new(&db_path)?);

        Ok(Self {
            db_path,
            import_api,
            session: Arc::new(Mutex::new(ImportSession::new())),
        })
    }

    /// 获取会话锁
    pub fn session(&self) -> ApiResult<MutexGuard<'_, ImportSession>> {
        self.session
            .lock()
            .map_err(|e| ApiError::InternalError(format!("session lock poisoned: {}", e)))
    }

    /// 提交当前会话
    ///
    /// 提交期间不持有会话锁，重复提交由会话的 importing 标记拦截
    pub async fn run_import(&self) -> ApiResult<CommitResult> {
        let (rows, mapping) = self.session()?.begin_import()?;
        let outcome = self.import_api.commit(&rows, &mapping).await;
        self.session()?.finish_import(outcome)
    }
}

/// 获取默认数据库路径
///
/// 优先级: WAREFLOW_DB_PATH 环境变量 → 用户数据目录/wareflow/wareflow.db → ./wareflow.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("WAREFLOW_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./wareflow.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("wareflow");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("wareflow.db");
        }
    }

    path.to_string_lossy().to_string()
}
