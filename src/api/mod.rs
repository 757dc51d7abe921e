// ==========================================
// BI 管理后台 - API 层
// ==========================================
// 职责: 提供导入 API 接口,供上传传输层调用
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{FieldDescriptor, FormatDescriptor, ImportApi, ImportApiResponse};
