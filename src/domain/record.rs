// ==========================================
// BI 管理后台 - 导入记录领域模型
// ==========================================
// 生命周期: 均为单次导入请求内的临时对象，不落库
// ParsedRecord → MappedRecord → ImportSummary
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// ==========================================
// CellValue - 原始单元格值（弱类型）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// 空值判定（空白文本视为空）
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
        }
    }
}

/// 整数值不带小数点输出（1.0 → "1"）
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// ==========================================
// ParsedRecord - 解析后的行
// ==========================================
// 列顺序 = 表头顺序
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    /// 数据行序号（从 1 开始）
    ///
    /// 只对非空行计数：表头之后整行为空的行（如 `,,`）被跳过且不占序号，
    /// 因此与文件中的物理行号不一定一致。RowError.row 使用同一编号。
    pub row_number: usize,
    pub cells: Vec<(String, CellValue)>,
}

impl ParsedRecord {
    pub fn new(row_number: usize, cells: Vec<(String, CellValue)>) -> Self {
        Self { row_number, cells }
    }

    /// 按原始列名取值（首个同名列）
    pub fn get(&self, label: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_empty())
    }
}

// ==========================================
// FieldValue - 类型化字段值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Boolean(bool),
    Absent, // 可选字段为空时显式置为缺省
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }
}

// ==========================================
// MappedRecord - 映射并校验后的行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedRecord {
    pub row_number: usize,
    pub values: Vec<(String, FieldValue)>, // 按格式字段顺序
}

impl MappedRecord {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| v)
    }
}

// ==========================================
// RowError - 行级错误
// ==========================================
// field = None 表示行级错误（如整列缺失、落库失败）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub field: Option<String>,
    pub reason: String,
}

impl RowError {
    pub fn row_level(row: usize, reason: impl Into<String>) -> Self {
        Self {
            row,
            field: None,
            reason: reason.into(),
        }
    }

    pub fn field_level(row: usize, field: &str, reason: impl Into<String>) -> Self {
        Self {
            row,
            field: Some(field.to_string()),
            reason: reason.into(),
        }
    }
}

impl PartialOrd for RowError {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// 行号优先，再按字段名（行级错误排在字段错误前）
impl Ord for RowError {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row
            .cmp(&other.row)
            .then_with(|| self.field.cmp(&other.field))
            .then_with(|| self.reason.cmp(&other.reason))
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "row {} [{}]: {}", self.row, field, self.reason),
            None => write!(f, "row {}: {}", self.row, self.reason),
        }
    }
}

// ==========================================
// ImportSummary - 导入结果汇总
// ==========================================
// 对外形状: { totalRows, insertedCount, failedCount, errors: [{row, field?, reason}] }
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub total_rows: usize,
    pub inserted_count: usize,
    pub failed_count: usize,
    pub mapping_failed: usize,     // 映射阶段被拒绝的行数
    pub persistence_failed: usize, // 落库阶段失败的行数
    pub errors: Vec<RowError>,     // 映射错误在前，落库错误在后
}

impl ImportSummary {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
