// ==========================================
// BI 管理后台 - 文件解析器实现
// ==========================================
// 阶段 1: 文件读取与解析
// 支持: CSV (.csv) / Excel (.xlsx/.xlsm/.xlsb/.xls) / ODS (.ods)
// 说明: 由声明的扩展名选择解码器，不做内容嗅探
// ==========================================

use crate::domain::{CellValue, ParsedRecord};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use calamine::{Data, Ods, Range, Reader, Xls, Xlsb, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

// ==========================================
// FileKind - 文件类型（按扩展名）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
    Xlsb,
    Xls,
    Ods,
}

impl FileKind {
    /// 从文件名扩展名识别（大小写不敏感）
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Some(FileKind::Csv),
            "xlsx" | "xlsm" => Some(FileKind::Xlsx),
            "xlsb" => Some(FileKind::Xlsb),
            "xls" => Some(FileKind::Xls),
            "ods" => Some(FileKind::Ods),
            _ => None,
        }
    }
}

/// 组装一行：短行补空，长行截断到表头宽度
fn build_cells(headers: &[String], mut values: impl Iterator<Item = CellValue>) -> Vec<(String, CellValue)> {
    headers
        .iter()
        .map(|h| (h.clone(), values.next().unwrap_or(CellValue::Empty)))
        .collect()
}

fn check_row_limit(max_rows: usize, count: usize, file_name: &str) -> ImportResult<()> {
    if max_rows > 0 && count > max_rows {
        return Err(ImportError::unreadable(
            file_name,
            format!("数据行超过上限 {}", max_rows),
        ));
    }
    Ok(())
}

// ==========================================
// CSV Parser 实现
// ==========================================
#[derive(Debug, Clone)]
pub struct CsvParser {
    delimiter: u8,
    max_rows: usize, // 0 = 不限
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            max_rows: 0,
        }
    }
}

impl CsvParser {
    pub fn new(delimiter: u8, max_rows: usize) -> Self {
        Self {
            delimiter,
            max_rows,
        }
    }
}

impl FileParser for CsvParser {
    fn parse_to_records(
        &self,
        content: &[u8],
        file_name: &str,
    ) -> ImportResult<Vec<ParsedRecord>> {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(self.delimiter)
            .from_reader(content);
        let mut rows = reader.into_records();

        // 第一条非空行为表头（csv 已跳过纯空行，这里再跳过只有分隔符的行）
        let headers: Vec<String> = loop {
            match rows.next() {
                None => {
                    return Err(ImportError::EmptyInput {
                        file_name: file_name.to_string(),
                    })
                }
                Some(result) => {
                    let record = result.map_err(|e| ImportError::unreadable(file_name, e))?;
                    if record.iter().all(|c| c.trim().is_empty()) {
                        continue;
                    }
                    break record
                        .iter()
                        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
                        .collect();
                }
            }
        };

        let mut records = Vec::new();
        for result in rows {
            let record = result.map_err(|e| ImportError::unreadable(file_name, e))?;

            let values = record.iter().map(|v| {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(trimmed.to_string())
                }
            });
            let parsed = ParsedRecord::new(records.len() + 1, build_cells(&headers, values));

            // 跳过完全空白的行
            if parsed.is_blank() {
                continue;
            }

            records.push(parsed);
            check_row_limit(self.max_rows, records.len(), file_name)?;
        }

        if records.is_empty() {
            return Err(ImportError::EmptyInput {
                file_name: file_name.to_string(),
            });
        }

        debug!(
            file_name = %file_name,
            columns = headers.len(),
            rows = records.len(),
            "CSV 解析完成"
        );
        Ok(records)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ExcelParser {
    max_rows: usize, // 0 = 不限
}

impl ExcelParser {
    pub fn new(max_rows: usize) -> Self {
        Self { max_rows }
    }

    /// 读取第一个工作表
    fn first_sheet<R>(content: &[u8], file_name: &str) -> ImportResult<Range<Data>>
    where
        R: Reader<Cursor<Vec<u8>>>,
        R::Error: std::fmt::Display,
    {
        let mut workbook =
            R::new(Cursor::new(content.to_vec())).map_err(|e| ImportError::unreadable(file_name, e))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::unreadable(file_name, "Excel 文件无工作表"))?;

        workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::unreadable(file_name, e))
    }

    /// 按扩展名选择工作簿类型后解析
    pub fn parse_kind(
        &self,
        kind: FileKind,
        content: &[u8],
        file_name: &str,
    ) -> ImportResult<Vec<ParsedRecord>> {
        let range = match kind {
            FileKind::Xlsx => Self::first_sheet::<Xlsx<_>>(content, file_name)?,
            FileKind::Xlsb => Self::first_sheet::<Xlsb<_>>(content, file_name)?,
            FileKind::Xls => Self::first_sheet::<Xls<_>>(content, file_name)?,
            FileKind::Ods => Self::first_sheet::<Ods<_>>(content, file_name)?,
            FileKind::Csv => {
                return Err(ImportError::unreadable(file_name, "CSV 文件不能按工作簿解析"))
            }
        };

        self.range_to_records(&range, file_name)
    }

    fn range_to_records(&self, range: &Range<Data>, file_name: &str) -> ImportResult<Vec<ParsedRecord>> {
        let mut rows = range.rows();

        // 提取表头（第一行）
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect(),
            None => {
                return Err(ImportError::EmptyInput {
                    file_name: file_name.to_string(),
                })
            }
        };

        let mut records = Vec::new();
        for data_row in rows {
            let values = data_row.iter().map(cell_to_value);
            let parsed = ParsedRecord::new(records.len() + 1, build_cells(&headers, values));

            if parsed.is_blank() {
                continue;
            }

            records.push(parsed);
            check_row_limit(self.max_rows, records.len(), file_name)?;
        }

        if records.is_empty() {
            return Err(ImportError::EmptyInput {
                file_name: file_name.to_string(),
            });
        }

        debug!(
            file_name = %file_name,
            columns = headers.len(),
            rows = records.len(),
            "Excel 解析完成"
        );
        Ok(records)
    }
}

impl FileParser for ExcelParser {
    fn parse_to_records(
        &self,
        content: &[u8],
        file_name: &str,
    ) -> ImportResult<Vec<ParsedRecord>> {
        match FileKind::from_file_name(file_name) {
            Some(FileKind::Csv) | None => Err(ImportError::unreadable(
                file_name,
                "文件格式不支持（仅支持 .xlsx/.xlsm/.xlsb/.xls/.ods）",
            )),
            Some(kind) => self.parse_kind(kind, content, file_name),
        }
    }
}

/// 单元格 → 弱类型值（保留源文件记录的类型）
fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(trimmed.to_string())
            }
        }
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::DateTime(dt) => match excel_serial_to_datetime(dt.as_f64()) {
            Some(value) => CellValue::DateTime(value),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Excel 序列日期（1900 系统，纪元 1899-12-30）→ 日期时间
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(chrono::Duration::milliseconds(millis))
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct UniversalFileParser {
    csv: CsvParser,
    excel: ExcelParser,
}

impl UniversalFileParser {
    pub fn new(csv: CsvParser, excel: ExcelParser) -> Self {
        Self { csv, excel }
    }
}

impl FileParser for UniversalFileParser {
    fn parse_to_records(
        &self,
        content: &[u8],
        file_name: &str,
    ) -> ImportResult<Vec<ParsedRecord>> {
        match FileKind::from_file_name(file_name) {
            Some(FileKind::Csv) => self.csv.parse_to_records(content, file_name),
            Some(kind) => self.excel.parse_kind(kind, content, file_name),
            None => Err(ImportError::unreadable(
                file_name,
                "文件格式不支持（仅支持 .csv/.xlsx/.xlsm/.xlsb/.xls/.ods）",
            )),
        }
    }
}
