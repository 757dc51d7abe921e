// ==========================================
// 数据导入API
// ==========================================
// 职责: 封装导入管道，供上传传输层（CLI/HTTP 等）调用
// 输入: 文件字节 + 原始文件名 + 格式 ID
// 输出: ImportApiResponse 或单个请求级错误
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::{ImportFormat, ImportSummary, ValueKind};
use crate::importer::{FormatRegistry, ImportService, Importer};
use crate::repository::{RecordStore, SqliteRecordStore};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportApiResponse {
    /// 格式 ID
    pub format_id: String,
    /// 原始文件名
    pub file_name: String,
    /// 导入汇总（totalRows / insertedCount / failedCount / errors）
    #[serde(flatten)]
    pub summary: ImportSummary,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

/// 格式字段描述（对外）
#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub aliases: Vec<String>,
    pub kind: ValueKind,
    pub required: bool,
}

/// 导入格式描述（对外）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDescriptor {
    pub id: String,
    pub target_entity: String,
    pub fields: Vec<FieldDescriptor>,
}

impl From<&ImportFormat> for FormatDescriptor {
    fn from(format: &ImportFormat) -> Self {
        Self {
            id: format.id.to_string(),
            target_entity: format.target_entity.to_string(),
            fields: format
                .fields
                .iter()
                .map(|f| FieldDescriptor {
                    name: f.name.to_string(),
                    aliases: f.aliases.iter().map(|a| a.to_string()).collect(),
                    kind: f.kind,
                    required: f.required,
                })
                .collect(),
        }
    }
}

/// 导入API
pub struct ImportApi {
    conn: Arc<Mutex<Connection>>,
}

impl ImportApi {
    /// 创建新的ImportApi实例（打开数据库并确保表存在）
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 列出全部导入格式
    pub fn list_formats(&self) -> Vec<FormatDescriptor> {
        FormatRegistry::builtin()
            .list_formats()
            .iter()
            .map(FormatDescriptor::from)
            .collect()
    }

    /// 导入内存中的文件内容
    ///
    /// # 参数
    /// - content: 文件字节
    /// - file_name: 原始文件名（扩展名决定解码器）
    /// - format_id: 导入格式 ID
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果（行级错误在 errors 中）
    /// - Err(ApiError): 未知格式 / 文件无法读取 / 无数据行
    pub async fn import_bytes(
        &self,
        content: &[u8],
        file_name: &str,
        format_id: &str,
    ) -> ApiResult<ImportApiResponse> {
        if file_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件名不能为空".to_string()));
        }

        let start_time = Instant::now();
        let importer = self.create_importer()?;
        let summary = importer.import_file(content, file_name, format_id).await?;

        Ok(ImportApiResponse {
            format_id: format_id.trim().to_string(),
            file_name: file_name.to_string(),
            summary,
            elapsed_ms: start_time.elapsed().as_millis() as i64,
        })
    }

    /// 从本地路径导入
    pub async fn import_file(&self, file_path: &str, format_id: &str) -> ApiResult<ImportApiResponse> {
        let path = Path::new(file_path);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::InvalidInput(format!("无效的文件路径: {}", file_path)))?
            .to_string();

        let content = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::InvalidInput(format!("文件读取失败 ({}): {}", file_path, e)))?;

        self.import_bytes(&content, &file_name, format_id).await
    }

    /// 统计目标实体记录数
    pub async fn count_records(&self, format_id: &str) -> ApiResult<usize> {
        let format = FormatRegistry::builtin()
            .find_format(format_id)
            .ok_or_else(|| ApiError::UnknownFormat(format_id.to_string()))?;

        let store = SqliteRecordStore::from_connection(self.conn.clone());
        Ok(store.count_records(format.target_entity).await?)
    }

    /// 配置管理器（与导入共用连接）
    pub fn config_manager(&self) -> ApiResult<ConfigManager> {
        ConfigManager::from_connection(self.conn.clone())
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    fn create_importer(&self) -> ApiResult<ImportService<SqliteRecordStore, ConfigManager>> {
        let store = SqliteRecordStore::from_connection(self.conn.clone());
        let config = self.config_manager()?;

        Ok(ImportService::new(store, config))
    }
}
