// ==========================================
// BI 管理后台 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 仅包含请求级（致命）错误；行级问题以 RowError 数据形式累积
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 请求级错误（在落库前中止）=====
    #[error("未知导入格式: {0}")]
    UnknownFormat(String),

    #[error("文件无法读取 ({file_name}): {reason}")]
    UnreadableFile { file_name: String, reason: String },

    #[error("文件无数据行 ({file_name})")]
    EmptyInput { file_name: String },

    // ===== 基础设施错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    pub fn unreadable(file_name: &str, reason: impl ToString) -> Self {
        ImportError::UnreadableFile {
            file_name: file_name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// 是否为调用方可直接提示用户的输入类错误
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ImportError::UnknownFormat(_)
                | ImportError::UnreadableFile { .. }
                | ImportError::EmptyInput { .. }
        )
    }
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::DatabaseError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
