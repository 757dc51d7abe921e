// ==========================================
// BI 管理后台 - 领域模型层
// ==========================================
// 职责: 定义导入格式与导入记录类型
// 红线: 不含数据访问逻辑,不含解析/映射逻辑
// ==========================================

pub mod format;
pub mod record;

// 重导出核心类型
pub use format::{normalize_label, FieldSpec, ImportFormat, ValueKind};
pub use record::{
    format_number, CellValue, FieldValue, ImportSummary, MappedRecord, ParsedRecord, RowError,
};
