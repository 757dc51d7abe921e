// ==========================================
// BI 管理后台 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换导入/仓储错误为用户友好的错误消息
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误（调用方可直接提示用户）
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("导入格式不存在: {0}")]
    UnknownFormat(String),

    #[error("文件无法读取: {0}")]
    UnreadableFile(String),

    #[error("文件没有数据行: {0}")]
    EmptyInput(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 面向调用方的错误码（供传输层渲染）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::UnknownFormat(_) => "UNKNOWN_FORMAT",
            ApiError::UnreadableFile(_) => "UNREADABLE_FILE",
            ApiError::EmptyInput(_) => "EMPTY_INPUT",
            ApiError::DatabaseError(_) | ApiError::DatabaseConnectionError(_) => "DATABASE",
            ApiError::ConfigError(_) => "CONFIG",
            ApiError::Other(_) => "INTERNAL",
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::UnknownFormat(id) => ApiError::UnknownFormat(id),
            err @ ImportError::UnreadableFile { .. } => ApiError::UnreadableFile(err.to_string()),
            ImportError::EmptyInput { file_name } => ApiError::EmptyInput(file_name),
            err @ ImportError::ConfigReadError { .. } => ApiError::ConfigError(err.to_string()),
            ImportError::DatabaseError(msg) => ApiError::DatabaseError(msg),
            ImportError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
