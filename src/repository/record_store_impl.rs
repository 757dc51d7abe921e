// ==========================================
// BI 管理后台 - 导入记录 Repository 实现
// ==========================================
// 职责: 实现导入落库（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据写入
// 约束: 所有值参数化；表名/列名仅来自静态格式目录
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{FieldValue, ImportFormat, MappedRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::record_store::RecordStore;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// 标识符校验（表名/列名只允许小写字母、数字、下划线）
fn check_identifier(ident: &str) -> RepositoryResult<&str> {
    let valid = !ident.is_empty()
        && ident
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(ident)
    } else {
        Err(RepositoryError::UnknownEntity(ident.to_string()))
    }
}

fn to_sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => Value::Text(s.clone()),
        FieldValue::Number(n) => Value::Real(*n),
        FieldValue::Date(d) => Value::Text(d.format("%Y-%m-%d").to_string()),
        FieldValue::Boolean(b) => Value::Integer(i64::from(*b)),
        FieldValue::Absent => Value::Null,
    }
}

// ==========================================
// SqliteRecordStore
// ==========================================
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与 ConfigManager 共用连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 构造 INSERT 语句
    fn build_insert_sql(format: &ImportFormat) -> RepositoryResult<String> {
        let table = check_identifier(format.target_entity)?;

        let mut columns = vec!["id"];
        for field in format.fields {
            columns.push(check_identifier(field.name)?);
        }
        columns.push("created_at");

        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();

        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders.join(", ")
        ))
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert_record(
        &self,
        format: &ImportFormat,
        record: &MappedRecord,
    ) -> RepositoryResult<()> {
        let sql = Self::build_insert_sql(format)?;

        let mut values = Vec::with_capacity(format.fields.len() + 2);
        values.push(Value::Text(Uuid::new_v4().to_string()));
        for field in format.fields {
            // 映射器保证每个字段都有值（可选字段为 Absent）
            let value = record
                .get(field.name)
                .map(to_sql_value)
                .unwrap_or(Value::Null);
            values.push(value);
        }
        values.push(Value::Text(Utc::now().to_rfc3339()));

        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let mut stmt = conn.prepare_cached(&sql)?;
        stmt.execute(params_from_iter(values))?;

        Ok(())
    }

    async fn count_records(&self, target_entity: &str) -> RepositoryResult<usize> {
        let table = check_identifier(target_entity)?;
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }
}
