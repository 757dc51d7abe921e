// ==========================================
// BI 管理后台 - 导入层
// ==========================================
// 职责: 外部表格数据导入，写入业务实体表
// 支持: CSV, Excel, ODS
// 流程: 格式注册表 → 文件解析 → 字段映射 → 落库
// ==========================================

// 模块声明
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod format_registry;
pub mod import_service;
pub mod importer_trait;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::{FieldMapper, REASON_MISSING_COLUMN, REASON_MISSING_VALUE};
pub use file_parser::{CsvParser, ExcelParser, FileKind, UniversalFileParser};
pub use format_registry::FormatRegistry;
pub use import_service::{
    ImportService, REASON_CONSTRAINT_VIOLATION, REASON_DATABASE_ERROR, REASON_DUPLICATE_VALUE,
};

// 重导出 Trait 接口
pub use importer_trait::{FileParser, Importer, MappingOutcome, RecordMapper};
