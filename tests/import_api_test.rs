// ==========================================
// ImportApi 集成测试
// ==========================================
// 测试目标: 文件路径导入、配置覆写、错误码
// ==========================================


use bi_import::api::{ApiError, ImportApi};
use bi_import::config::config_keys;
use std::io::Write;
use tempfile::Builder;
use test_helpers::{count_rows, create_test_db, insert_test_config};

fn write_temp_file(suffix: &str, content: &[u8]) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_import_file_from_path() {
    let (_temp, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(&db_path).unwrap();
    let file = write_temp_file(".csv", b"Name,Email\nAlice,a@x.com\nBob,b@x.com\n");

    let response = api
        .import_file(file.path().to_str().unwrap(), "customers")
        .await
        .unwrap();

    assert_eq!(response.format_id, "customers");
    assert!(response.file_name.ends_with(".csv"));
    assert_eq!(response.summary.inserted_count, 2);
    assert_eq!(count_rows(&db_path, "customers").unwrap(), 2);
    assert_eq!(api.count_records("customers").await.unwrap(), 2);
}

#[tokio::test]
async fn test_missing_file_is_invalid_input() {
    let (_temp, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(&db_path).unwrap();

    let result = api.import_file("/nonexistent/dir/nothing.csv", "customers").await;

    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
}

#[tokio::test]
async fn test_error_codes_for_fatal_failures() {
    let (_temp, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(&db_path).unwrap();

    let unknown = api.import_bytes(b"Name\nA\n", "a.csv", "invoices").await.unwrap_err();
    assert_eq!(unknown.code(), "UNKNOWN_FORMAT");

    let empty = api.import_bytes(b"Name\n", "a.csv", "customers").await.unwrap_err();
    assert_eq!(empty.code(), "EMPTY_INPUT");

    let unreadable = api.import_bytes(b"Name\nA\n", "a.txt", "customers").await.unwrap_err();
    assert_eq!(unreadable.code(), "UNREADABLE_FILE");
}

#[tokio::test]
async fn test_config_delimiter_override() {
    let (_temp, db_path) = create_test_db().unwrap();
    insert_test_config(&db_path, config_keys::CSV_DELIMITER, ";").unwrap();
    let api = ImportApi::new(&db_path).unwrap();

    let response = api
        .import_bytes(b"Name;Email\nAlice;a@x.com\n", "a.csv", "customers")
        .await
        .unwrap();

    assert_eq!(response.summary.inserted_count, 1);
    assert!(response.summary.errors.is_empty());
}

#[tokio::test]
async fn test_config_written_through_api_applies_to_next_import() {
    let (_temp, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(&db_path).unwrap();
    api.config_manager()
        .unwrap()
        .set_global_config_value(config_keys::MAX_ROWS, "1")
        .unwrap();

    let result = api
        .import_bytes(b"Name\nAlice\nBob\n", "a.csv", "customers")
        .await;

    assert!(matches!(result, Err(ApiError::UnreadableFile(_))));
    assert_eq!(count_rows(&db_path, "customers").unwrap(), 0);
}

#[tokio::test]
async fn test_response_json_matches_result_contract() {
    let (_temp, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(&db_path).unwrap();

    let response = api
        .import_bytes(b"Name,Email\n,x@x.com\nBob,b@x.com\n", "a.csv", "customers")
        .await
        .unwrap();
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["totalRows"], 2);
    assert_eq!(json["insertedCount"], 1);
    assert_eq!(json["failedCount"], 1);
    assert_eq!(json["errors"][0]["row"], 1);
    assert_eq!(json["errors"][0]["field"], "name");
    assert_eq!(json["errors"][0]["reason"], "missing required value");
}
