// ==========================================
// BI 管理后台 - 导入管道 Trait
// ==========================================
// 职责: 定义导入各阶段接口（不包含实现）
// 流程: 解析 → 映射 → 落库
// ==========================================

use crate::domain::{ImportFormat, ImportSummary, MappedRecord, ParsedRecord, RowError};
use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件字节 → 弱类型行记录
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件内容
    ///
    /// # 参数
    /// - content: 文件原始字节
    /// - file_name: 原始文件名（仅用于错误信息）
    ///
    /// # 返回
    /// - Ok(Vec<ParsedRecord>): 至少一条数据行，顺序与文件一致
    /// - Err(EmptyInput): 表头之后无数据行
    /// - Err(UnreadableFile): 无法解码
    fn parse_to_records(&self, content: &[u8], file_name: &str)
        -> ImportResult<Vec<ParsedRecord>>;
}

// ==========================================
// MappingOutcome - 映射阶段输出
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct MappingOutcome {
    pub total_rows: usize,
    pub records: Vec<MappedRecord>, // 仅完全合法的行
    pub errors: Vec<RowError>,      // 所有行的映射错误（行号、字段名有序）
    pub rejected_rows: usize,
}

// ==========================================
// RecordMapper Trait
// ==========================================
// 用途: 行记录 → 目标格式的强类型记录
// 实现者: FieldMapper
pub trait RecordMapper: Send + Sync {
    /// 映射单行；失败时返回该行全部错误
    fn map_record(
        &self,
        format: &ImportFormat,
        record: &ParsedRecord,
    ) -> Result<MappedRecord, Vec<RowError>>;

    /// 映射整批
    fn map_records(&self, format: &ImportFormat, records: &[ParsedRecord]) -> MappingOutcome {
        let mut outcome = MappingOutcome {
            total_rows: records.len(),
            ..Default::default()
        };

        for record in records {
            match self.map_record(format, record) {
                Ok(mapped) => outcome.records.push(mapped),
                Err(mut errors) => {
                    outcome.rejected_rows += 1;
                    outcome.errors.append(&mut errors);
                }
            }
        }

        outcome.errors.sort();
        outcome
    }
}

// ==========================================
// Importer Trait
// ==========================================
// 用途: 导入主接口（单请求、无状态）
// 实现者: ImportService
#[async_trait]
pub trait Importer: Send + Sync {
    /// 导入一个上传文件
    ///
    /// # 参数
    /// - content: 文件字节
    /// - file_name: 原始文件名（扩展名决定解码器）
    /// - format_id: 导入格式 ID
    ///
    /// # 返回
    /// - Ok(ImportSummary): 行级错误包含在汇总中
    /// - Err: UnknownFormat / UnreadableFile / EmptyInput 等请求级错误（落库前中止）
    async fn import_file(
        &self,
        content: &[u8],
        file_name: &str,
        format_id: &str,
    ) -> ImportResult<ImportSummary>;
}
