// ==========================================
// BI 管理后台 - 数据导入核心库
// ==========================================
// 技术栈: Rust + SQLite (rusqlite) + csv/calamine
// 系统定位: 管理员上传表格文件，按格式映射后写入业务表
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 格式与记录类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 解析、映射、落库编排
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 对外接口
pub mod api;

// 应用层 - 共享状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CellValue, FieldSpec, FieldValue, ImportFormat, ImportSummary, MappedRecord, ParsedRecord,
    RowError, ValueKind,
};

// 导入组件
pub use importer::{
    FieldMapper, FileParser, FormatRegistry, ImportError, ImportService, Importer, RecordMapper,
    UniversalFileParser,
};

// API
pub use api::{ApiError, ImportApi, ImportApiResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "BI 管理后台数据导入";
