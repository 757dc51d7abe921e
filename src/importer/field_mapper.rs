// ==========================================
// BI 管理后台 - 字段映射器实现
// ==========================================
// 阶段 2: 列名 → 标准字段（别名匹配）+ 类型转换
// 规则: 一行要么全部必填字段转换成功，要么整行拒绝
// ==========================================

use crate::domain::{
    format_number, normalize_label, CellValue, FieldSpec, FieldValue, ImportFormat, MappedRecord,
    ParsedRecord, RowError, ValueKind,
};
use crate::importer::file_parser::excel_serial_to_datetime;
use crate::importer::importer_trait::RecordMapper;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub const REASON_MISSING_COLUMN: &str = "missing required column";
pub const REASON_MISSING_VALUE: &str = "missing required value";

// 文本日期可接受的格式（按顺序尝试）
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

#[derive(Debug, Clone, Default)]
pub struct FieldMapper;

impl RecordMapper for FieldMapper {
    fn map_record(
        &self,
        format: &ImportFormat,
        record: &ParsedRecord,
    ) -> Result<MappedRecord, Vec<RowError>> {
        let row = record.row_number;

        // 每行只做一次列名标准化
        let labels: Vec<String> = record
            .cells
            .iter()
            .map(|(label, _)| normalize_label(label))
            .collect();

        let columns = format.resolve_columns(&labels);

        let mut values = Vec::with_capacity(format.fields.len());
        let mut errors = Vec::new();

        for (field, column) in format.fields.iter().zip(columns) {
            let matched = column.map(|idx| &record.cells[idx].1);

            let cell = match matched {
                Some(cell) => cell,
                None if field.required => {
                    // 整列缺失：格式与文件不匹配，本行直接短路
                    return Err(vec![RowError::row_level(
                        row,
                        format!("{}: {}", REASON_MISSING_COLUMN, field.name),
                    )]);
                }
                None => {
                    values.push((field.name.to_string(), FieldValue::Absent));
                    continue;
                }
            };

            match coerce(field, cell) {
                Ok(value) => values.push((field.name.to_string(), value)),
                Err(reason) => errors.push(RowError::field_level(row, field.name, reason)),
            }
        }

        if errors.is_empty() {
            Ok(MappedRecord {
                row_number: row,
                values,
            })
        } else {
            errors.sort();
            Err(errors)
        }
    }
}

/// 按字段声明类型转换单元格
fn coerce(field: &FieldSpec, cell: &CellValue) -> Result<FieldValue, String> {
    if cell.is_empty() {
        return if field.required {
            Err(REASON_MISSING_VALUE.to_string())
        } else {
            Ok(FieldValue::Absent)
        };
    }

    match field.kind {
        ValueKind::Text => Ok(FieldValue::Text(cell.to_string().trim().to_string())),
        ValueKind::Number => coerce_number(cell).map(FieldValue::Number),
        ValueKind::Date => coerce_date(cell).map(FieldValue::Date),
        ValueKind::Boolean => coerce_bool(cell).map(FieldValue::Boolean),
    }
}

fn coerce_number(cell: &CellValue) -> Result<f64, String> {
    match cell {
        CellValue::Number(n) if n.is_finite() => Ok(*n),
        CellValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| format!("invalid number: {}", s.trim())),
        other => Err(format!("invalid number: {}", other)),
    }
}

fn coerce_date(cell: &CellValue) -> Result<NaiveDate, String> {
    match cell {
        CellValue::DateTime(dt) => Ok(dt.date()),
        CellValue::Number(n) if *n > 0.0 => excel_serial_to_datetime(*n)
            .map(|dt| dt.date())
            .ok_or_else(|| format!("invalid date: {}", format_number(*n))),
        CellValue::Text(s) => {
            parse_date_text(s.trim()).ok_or_else(|| format!("invalid date: {}", s.trim()))
        }
        other => Err(format!("invalid date: {}", other)),
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn coerce_bool(cell: &CellValue) -> Result<bool, String> {
    match cell {
        CellValue::Boolean(b) => Ok(*b),
        CellValue::Number(n) if *n == 1.0 => Ok(true),
        CellValue::Number(n) if *n == 0.0 => Ok(false),
        CellValue::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "是" => Ok(true),
            "false" | "no" | "n" | "0" | "否" => Ok(false),
            _ => Err(format!("invalid boolean: {}", s.trim())),
        },
        other => Err(format!("invalid boolean: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::format_registry::FormatRegistry;

    fn row(row_number: usize, cells: &[(&str, &str)]) -> ParsedRecord {
        ParsedRecord::new(
            row_number,
            cells
                .iter()
                .map(|(l, v)| {
                    let value = if v.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(v.to_string())
                    };
                    (l.to_string(), value)
                })
                .collect(),
        )
    }

    fn customers() -> &'static ImportFormat {
        FormatRegistry::builtin().find_format("customers").unwrap()
    }

    fn employees() -> &'static ImportFormat {
        FormatRegistry::builtin().find_format("employees").unwrap()
    }

    #[test]
    fn test_field_mapper_basic() {
        let record = row(1, &[("Name", "Alice"), ("Email", "a@x.com"), ("Phone", "555")]);

        let mapped = FieldMapper.map_record(customers(), &record).unwrap();

        assert_eq!(mapped.row_number, 1);
        assert_eq!(mapped.get("name"), Some(&FieldValue::Text("Alice".into())));
        assert_eq!(mapped.get("email"), Some(&FieldValue::Text("a@x.com".into())));
        assert_eq!(mapped.get("phone"), Some(&FieldValue::Text("555".into())));
    }

    #[test]
    fn test_canonical_and_alias_labels_map_identically() {
        let canonical = row(1, &[("name", "Alice"), ("email", "a@x.com")]);
        let aliased = row(1, &[("  customer NAME ", "Alice"), ("E-MAIL", "a@x.com")]);

        let a = FieldMapper.map_record(customers(), &canonical).unwrap();
        let b = FieldMapper.map_record(customers(), &aliased).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_optional_empty_is_explicit_absent() {
        let record = row(2, &[("Name", "Bob"), ("Email", ""), ("Phone", "")]);

        let mapped = FieldMapper.map_record(customers(), &record).unwrap();

        // 未出现的可选列同样显式为 Absent
        assert_eq!(mapped.values.len(), customers().fields.len());
        assert_eq!(mapped.get("email"), Some(&FieldValue::Absent));
        assert_eq!(mapped.get("company"), Some(&FieldValue::Absent));
    }

    #[test]
    fn test_missing_required_column_is_row_level() {
        let record = row(3, &[("Email", "a@x.com"), ("Phone", "555")]);

        let errors = FieldMapper.map_record(customers(), &record).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 3);
        assert_eq!(errors[0].field, None);
        assert!(errors[0].reason.starts_with(REASON_MISSING_COLUMN));
    }

    #[test]
    fn test_empty_required_value() {
        let record = row(1, &[("Name", ""), ("Email", "b@x.com"), ("Phone", "555")]);

        let errors = FieldMapper.map_record(customers(), &record).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field.as_deref(), Some("name"));
        assert_eq!(errors[0].reason, REASON_MISSING_VALUE);
    }

    #[test]
    fn test_invalid_number_rejects_whole_row() {
        let record = row(
            4,
            &[("Name", "Carol"), ("Email", "c@x.com"), ("Salary", "abc")],
        );

        let errors = FieldMapper.map_record(employees(), &record).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 4);
        assert_eq!(errors[0].field.as_deref(), Some("salary"));
        assert!(errors[0].reason.contains("abc"));
    }

    #[test]
    fn test_all_field_errors_accumulated_and_sorted() {
        let record = row(
            1,
            &[
                ("Name", "Dan"),
                ("Email", "d@x.com"),
                ("Salary", "lots"),
                ("Hire Date", "yesterday"),
                ("Active", "maybe"),
            ],
        );

        let errors = FieldMapper.map_record(employees(), &record).unwrap_err();

        let fields: Vec<_> = errors.iter().map(|e| e.field.as_deref().unwrap()).collect();
        assert_eq!(fields, vec!["active", "hire_date", "salary"]);
    }

    #[test]
    fn test_typed_coercions() {
        let record = row(
            1,
            &[
                ("Name", "Eve"),
                ("Email", "e@x.com"),
                ("Salary", " 4200.50 "),
                ("Hire Date", "2023/07/15"),
                ("Active", "Yes"),
            ],
        );

        let mapped = FieldMapper.map_record(employees(), &record).unwrap();

        assert_eq!(mapped.get("salary"), Some(&FieldValue::Number(4200.5)));
        assert_eq!(
            mapped.get("hire_date"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2023, 7, 15).unwrap()))
        );
        assert_eq!(mapped.get("active"), Some(&FieldValue::Boolean(true)));
    }

    #[test]
    fn test_first_matching_column_wins() {
        let record = row(
            1,
            &[("Name", "First"), ("Customer Name", "Second"), ("name", "Third")],
        );

        let mapped = FieldMapper.map_record(customers(), &record).unwrap();

        assert_eq!(mapped.get("name"), Some(&FieldValue::Text("First".into())));
    }

    #[test]
    fn test_unrecognized_columns_ignored() {
        let record = row(1, &[("Name", "Alice"), ("Favourite Colour", "teal")]);

        let mapped = FieldMapper.map_record(customers(), &record).unwrap();

        assert!(mapped.values.iter().all(|(name, _)| name != "Favourite Colour"));
        assert!(customers().field("favourite colour").is_none());
    }

    #[test]
    fn test_spreadsheet_typed_cells() {
        let record = ParsedRecord::new(
            1,
            vec![
                ("Name".to_string(), CellValue::Text("Fay".into())),
                ("Email".to_string(), CellValue::Text("f@x.com".into())),
                ("Salary".to_string(), CellValue::Number(3000.0)),
                ("Hire Date".to_string(), CellValue::Number(45292.0)),
                ("Active".to_string(), CellValue::Boolean(false)),
            ],
        );

        let mapped = FieldMapper.map_record(employees(), &record).unwrap();

        assert_eq!(
            mapped.get("hire_date"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
        );
        assert_eq!(mapped.get("active"), Some(&FieldValue::Boolean(false)));
    }

    #[test]
    fn test_number_cell_into_text_field() {
        let record = ParsedRecord::new(
            1,
            vec![
                ("Name".to_string(), CellValue::Text("Gus".into())),
                ("Phone".to_string(), CellValue::Number(5550100.0)),
            ],
        );

        let mapped = FieldMapper.map_record(customers(), &record).unwrap();

        assert_eq!(mapped.get("phone"), Some(&FieldValue::Text("5550100".into())));
    }

    #[test]
    fn test_map_records_keeps_order_and_counts() {
        let records = vec![
            row(1, &[("Name", "Alice")]),
            row(2, &[("Name", "")]),
            row(3, &[("Name", "Carol")]),
        ];

        let outcome = FieldMapper.map_records(customers(), &records);

        assert_eq!(outcome.total_rows, 3);
        assert_eq!(outcome.rejected_rows, 1);
        let rows: Vec<_> = outcome.records.iter().map(|r| r.row_number).collect();
        assert_eq!(rows, vec![1, 3]);
        assert_eq!(outcome.errors[0].row, 2);
    }

    #[test]
    fn test_parse_date_text_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        assert_eq!(parse_date_text("2025-01-20"), Some(expected));
        assert_eq!(parse_date_text("20250120"), Some(expected));
        assert_eq!(parse_date_text("20.01.2025"), Some(expected));
        assert_eq!(parse_date_text("2025-01-20T08:30:00Z"), Some(expected));
        assert_eq!(parse_date_text("2025-01-20 08:30:00"), Some(expected));
        assert_eq!(parse_date_text("01/20/2025"), None);
    }
}
