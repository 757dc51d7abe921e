// ==========================================
// Excel 导入集成测试
// ==========================================
// 测试目标: 运行时生成 xlsx，验证首个工作表解析与落库
// ==========================================


use bi_import::domain::CellValue;
use bi_import::importer::{FileParser, ImportService, Importer, UniversalFileParser};
use bi_import::repository::SqliteRecordStore;
use chrono::NaiveDate;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use test_helpers::{column_values, count_rows, create_test_db, MockConfig};

/// 两个工作表：Staff（员工数据）与 Archive（应被忽略）
fn build_staff_workbook() -> Vec<u8> {
    let mut wb = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    {
        let ws = wb.add_worksheet();
        ws.set_name("Staff").unwrap();
        ws.write_string(0, 0, "Name").unwrap();
        ws.write_string(0, 1, "Email").unwrap();
        ws.write_string(0, 2, "Hire Date").unwrap();
        ws.write_string(0, 3, "Salary").unwrap();
        ws.write_string(0, 4, "Active").unwrap();

        let hire_date = ExcelDateTime::from_ymd(2024, 3, 1).unwrap();
        ws.write_string(1, 0, "Dana").unwrap();
        ws.write_string(1, 1, "d@x.com").unwrap();
        ws.write_datetime_with_format(1, 2, &hire_date, &date_format)
            .unwrap();
        ws.write_number(1, 3, 1200.5).unwrap();
        ws.write_boolean(1, 4, true).unwrap();
    }

    {
        let ws = wb.add_worksheet();
        ws.set_name("Archive").unwrap();
        ws.write_string(0, 0, "Name").unwrap();
        ws.write_string(0, 1, "Email").unwrap();
        ws.write_string(1, 0, "Old").unwrap();
        ws.write_string(1, 1, "old@x.com").unwrap();
        ws.write_string(2, 0, "Older").unwrap();
        ws.write_string(2, 1, "older@x.com").unwrap();
    }

    wb.save_to_buffer().unwrap()
}

#[test]
fn test_xlsx_first_sheet_cell_types_preserved() {
    let content = build_staff_workbook();

    let records = UniversalFileParser::default()
        .parse_to_records(&content, "staff.xlsx")
        .unwrap();

    // 只读取第一个工作表
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.row_number, 1);
    assert_eq!(record.get("Name"), Some(&CellValue::Text("Dana".to_string())));
    assert_eq!(
        record.get("Hire Date"),
        Some(&CellValue::DateTime(
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        ))
    );
    assert_eq!(record.get("Salary"), Some(&CellValue::Number(1200.5)));
    assert_eq!(record.get("Active"), Some(&CellValue::Boolean(true)));
}

#[tokio::test]
async fn test_xlsx_employees_import_persists_row() {
    let (_temp, db_path) = create_test_db().unwrap();
    let store = SqliteRecordStore::new(&db_path).unwrap();
    let service = ImportService::new(store, MockConfig::default());

    let summary = service
        .import_file(&build_staff_workbook(), "staff.xlsx", "employees")
        .await
        .unwrap();

    assert_eq!(summary.total_rows, 1);
    assert_eq!(summary.inserted_count, 1);
    assert!(summary.errors.is_empty());
    assert_eq!(count_rows(&db_path, "employees").unwrap(), 1);
    assert_eq!(
        column_values(&db_path, "employees", "hire_date").unwrap(),
        vec![Some("2024-03-01".to_string())]
    );
    assert_eq!(
        column_values(&db_path, "employees", "salary").unwrap(),
        vec![Some("1200.5".to_string())]
    );
}
