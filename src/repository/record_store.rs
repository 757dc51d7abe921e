// ==========================================
// BI 管理后台 - 导入记录 Repository Trait
// ==========================================
// 职责: "插入一行，返回成功或结构化失败原因"
// 红线: Repository 不含业务规则，只做数据写入
// ==========================================

use crate::domain::{ImportFormat, MappedRecord};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// RecordStore Trait
// ==========================================
// 用途: 导入落库
// 实现者: SqliteRecordStore（使用 rusqlite）
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 插入一条映射后的记录到格式的目标实体
    ///
    /// # 参数
    /// - format: 导入格式（决定目标表和列）
    /// - record: 已校验记录
    ///
    /// # 返回
    /// - Ok(()): 插入成功
    /// - Err: 约束违反/数据库错误（只影响本行）
    async fn insert_record(
        &self,
        format: &ImportFormat,
        record: &MappedRecord,
    ) -> RepositoryResult<()>;

    /// 统计目标实体记录数
    async fn count_records(&self, target_entity: &str) -> RepositoryResult<usize>;
}
