// ==========================================
// BI 管理后台 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::Arc;

use crate::api::ImportApi;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "BI_IMPORT_DB_PATH";

/// 应用状态
///
/// 传输层（CLI/HTTP）持有一份，跨请求共享
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 数据导入API
    pub import_api: Arc<ImportApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let import_api = ImportApi::new(&db_path)
            .map_err(|e| format!("无法创建ImportApi: {}", e))?;

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            import_api: Arc::new(import_api),
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: BI_IMPORT_DB_PATH 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./bi_import.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("bi-import");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("bi_import.db");
        }
    }

    path.to_string_lossy().to_string()
}
