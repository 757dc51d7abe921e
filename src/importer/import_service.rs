// ==========================================
// BI 管理后台 - 导入服务实现
// ==========================================
// 职责: 整合导入流程，从上传文件到数据库
// 流程: 格式查找 → 解析 → 映射 → 逐行落库 → 汇总
// 策略: 逐行独立写入（尽力而为，非整批事务），每行只尝试一次
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::{ImportFormat, ImportSummary, RowError};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{CsvParser, ExcelParser, UniversalFileParser};
use crate::importer::format_registry::FormatRegistry;
use crate::importer::importer_trait::{FileParser, Importer, MappingOutcome, RecordMapper};
use crate::repository::{RecordStore, RepositoryError};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

pub const REASON_DUPLICATE_VALUE: &str = "duplicate value";
pub const REASON_CONSTRAINT_VIOLATION: &str = "constraint violation";
pub const REASON_DATABASE_ERROR: &str = "database error";

/// 落库失败 → 行级错误原因（与映射错误同为英文契约文案）
fn persistence_reason(err: &RepositoryError) -> String {
    match err {
        RepositoryError::UniqueConstraintViolation(detail) => {
            format!("{}: {}", REASON_DUPLICATE_VALUE, detail)
        }
        RepositoryError::ForeignKeyViolation(detail)
        | RepositoryError::NotNullViolation(detail)
        | RepositoryError::CheckConstraintViolation(detail) => {
            format!("{}: {}", REASON_CONSTRAINT_VIOLATION, detail)
        }
        RepositoryError::UnknownEntity(detail)
        | RepositoryError::DatabaseConnectionError(detail)
        | RepositoryError::LockError(detail)
        | RepositoryError::DatabaseQueryError(detail) => {
            format!("{}: {}", REASON_DATABASE_ERROR, detail)
        }
        RepositoryError::Other(inner) => format!("{}: {}", REASON_DATABASE_ERROR, inner),
    }
}

// ==========================================
// ImportService - 导入服务
// ==========================================
pub struct ImportService<S, C>
where
    S: RecordStore,
    C: ImportConfigReader,
{
    // 数据访问层
    store: S,

    // 配置读取器
    config: C,

    // 导入组件
    registry: &'static FormatRegistry,
    mapper: Box<dyn RecordMapper>,
}

impl<S, C> ImportService<S, C>
where
    S: RecordStore,
    C: ImportConfigReader,
{
    /// 使用内置格式目录和默认映射器创建
    pub fn new(store: S, config: C) -> Self {
        Self::with_components(store, config, FormatRegistry::builtin(), Box::new(FieldMapper))
    }

    /// 创建新的 ImportService 实例
    ///
    /// # 参数
    /// - store: 落库仓储
    /// - config: 配置读取器
    /// - registry: 格式目录
    /// - mapper: 字段映射器
    pub fn with_components(
        store: S,
        config: C,
        registry: &'static FormatRegistry,
        mapper: Box<dyn RecordMapper>,
    ) -> Self {
        Self {
            store,
            config,
            registry,
            mapper,
        }
    }

    pub fn registry(&self) -> &'static FormatRegistry {
        self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 按当前配置构造解析器
    async fn build_parser(&self) -> ImportResult<UniversalFileParser> {
        let delimiter = self
            .config
            .get_csv_delimiter()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: crate::config::config_keys::CSV_DELIMITER.to_string(),
                message: e.to_string(),
            })?;
        let max_rows = self
            .config
            .get_max_rows()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: crate::config::config_keys::MAX_ROWS.to_string(),
                message: e.to_string(),
            })?;

        Ok(UniversalFileParser::new(
            CsvParser::new(delimiter, max_rows),
            ExcelParser::new(max_rows),
        ))
    }

    /// 落库映射结果并汇总
    ///
    /// # 说明
    /// - 每行独立写入；某行失败记录为该行的 RowError，不影响其他行
    /// - 并发写入时保持行号与结果的对应关系（buffered 保序）
    /// - 返回的 errors：映射错误在前，落库错误在后
    pub async fn persist(
        &self,
        format: &ImportFormat,
        outcome: MappingOutcome,
    ) -> ImportResult<ImportSummary> {
        let MappingOutcome {
            total_rows,
            records,
            errors: mapping_errors,
            rejected_rows,
        } = outcome;

        let concurrency = self
            .config
            .get_insert_concurrency()
            .await
            .map_err(|e| ImportError::ConfigReadError {
                key: crate::config::config_keys::INSERT_CONCURRENCY.to_string(),
                message: e.to_string(),
            })?
            .max(1);

        debug!(
            target_entity = format.target_entity,
            rows = records.len(),
            concurrency = concurrency,
            "开始落库"
        );

        // 先按行构造写入 future（各自持有记录），再按并发度驱动
        let store = &self.store;
        let inserts: Vec<_> = records
            .into_iter()
            .map(|record| async move {
                let result = store.insert_record(format, &record).await;
                (record.row_number, result)
            })
            .collect();

        let results: Vec<_> = stream::iter(inserts)
            .buffered(concurrency)
            .collect()
            .await;

        let mut inserted_count = 0;
        let mut persistence_errors = Vec::new();
        for (row, result) in results {
            match result {
                Ok(()) => inserted_count += 1,
                Err(e) => {
                    // 约束冲突是数据问题；其余为基础设施问题
                    if e.is_constraint_violation() {
                        warn!(row_number = row, error = %e, "记录落库失败");
                    } else {
                        error!(row_number = row, error = %e, "记录落库失败");
                    }
                    persistence_errors.push(RowError::row_level(row, persistence_reason(&e)));
                }
            }
        }

        let persistence_failed = persistence_errors.len();
        let mut errors = mapping_errors;
        errors.extend(persistence_errors);

        Ok(ImportSummary {
            total_rows,
            inserted_count,
            failed_count: rejected_rows + persistence_failed,
            mapping_failed: rejected_rows,
            persistence_failed,
            errors,
        })
    }
}

#[async_trait]
impl<S, C> Importer for ImportService<S, C>
where
    S: RecordStore,
    C: ImportConfigReader,
{
    #[instrument(skip(self, content), fields(size = content.len()))]
    async fn import_file(
        &self,
        content: &[u8],
        file_name: &str,
        format_id: &str,
    ) -> ImportResult<ImportSummary> {
        let start_time = Instant::now();
        info!("开始导入");

        // === 步骤 0: 格式查找（解析前校验）===
        let format = match self.registry.find_format(format_id) {
            Some(format) => format,
            None => {
                warn!("未知导入格式");
                return Err(ImportError::UnknownFormat(format_id.to_string()));
            }
        };

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let parser = self.build_parser().await?;
        let records = parser.parse_to_records(content, file_name).map_err(|e| {
            if e.is_user_facing() {
                warn!(error = %e, "文件解析失败");
            } else {
                error!(error = %e, "文件解析失败");
            }
            e
        })?;
        info!(total_rows = records.len(), "文件解析完成");

        // === 步骤 2: 字段映射 ===
        debug!("步骤 2: 字段映射");
        let outcome = self.mapper.map_records(format, &records);
        drop(records);
        for err in &outcome.errors {
            debug!(row_number = err.row, field = ?err.field, reason = %err.reason, "行映射失败");
        }
        info!(
            success = outcome.records.len(),
            rejected = outcome.rejected_rows,
            "字段映射完成"
        );

        // === 步骤 3: 逐行落库 ===
        debug!("步骤 3: 落库");
        let summary = self.persist(format, outcome).await?;

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        if summary.is_clean() {
            info!(
                total = summary.total_rows,
                inserted = summary.inserted_count,
                elapsed_ms = elapsed_ms,
                "导入完成"
            );
        } else {
            warn!(
                total = summary.total_rows,
                inserted = summary.inserted_count,
                failed = summary.failed_count,
                elapsed_ms = elapsed_ms,
                "导入完成（部分行失败）"
            );
        }

        Ok(summary)
    }
}
