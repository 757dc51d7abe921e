// ==========================================
// BI 管理后台 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// 并发度上限
pub const MAX_INSERT_CONCURRENCY: usize = 32;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, "配置已更新");
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有配置的快照（JSON格式，按 key 排序）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_insert_concurrency(&self) -> ConfigResult<usize> {
        let value = self.get_config_or_default(config_keys::INSERT_CONCURRENCY, "1")?;
        let parsed = value.trim().parse::<usize>().unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::INSERT_CONCURRENCY,
                raw_value = %value,
                "落库并发度配置格式错误，使用默认值 1"
            );
            1
        });
        Ok(parsed.clamp(1, MAX_INSERT_CONCURRENCY))
    }

    async fn get_csv_delimiter(&self) -> ConfigResult<u8> {
        let value = self.get_config_or_default(config_keys::CSV_DELIMITER, ",")?;
        parse_delimiter(&value).ok_or_else(|| {
            format!("CSV 分隔符必须是单个 ASCII 字符: {:?}", value).into()
        })
    }

    async fn get_max_rows(&self) -> ConfigResult<usize> {
        let value = self.get_config_or_default(config_keys::MAX_ROWS, "0")?;
        Ok(value.trim().parse::<usize>().unwrap_or(0))
    }
}

fn parse_delimiter(raw: &str) -> Option<u8> {
    match raw {
        "\\t" | "\t" | "tab" => Some(b'\t'),
        s if s.len() == 1 && s.is_ascii() => s.bytes().next(),
        _ => None,
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 落库
    pub const INSERT_CONCURRENCY: &str = "import.insert_concurrency";

    // 解析
    pub const CSV_DELIMITER: &str = "import.csv_delimiter";
    pub const MAX_ROWS: &str = "import.max_rows";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults() {
        let config = manager();

        assert_eq!(config.get_insert_concurrency().await.unwrap(), 1);
        assert_eq!(config.get_csv_delimiter().await.unwrap(), b',');
        assert_eq!(config.get_max_rows().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_overrides_and_clamping() {
        let config = manager();
        config
            .set_global_config_value(config_keys::INSERT_CONCURRENCY, "500")
            .unwrap();
        config
            .set_global_config_value(config_keys::CSV_DELIMITER, "\\t")
            .unwrap();

        assert_eq!(
            config.get_insert_concurrency().await.unwrap(),
            MAX_INSERT_CONCURRENCY
        );
        assert_eq!(config.get_csv_delimiter().await.unwrap(), b'\t');
    }

    #[tokio::test]
    async fn test_invalid_delimiter_is_error() {
        let config = manager();
        config
            .set_global_config_value(config_keys::CSV_DELIMITER, ";;")
            .unwrap();

        assert!(config.get_csv_delimiter().await.is_err());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let config = manager();
        config
            .set_global_config_value(config_keys::MAX_ROWS, "1000")
            .unwrap();

        let snapshot = config.get_config_snapshot().unwrap();
        assert!(snapshot.contains("import.max_rows"));

        let other = manager();
        assert_eq!(other.restore_config_from_snapshot(&snapshot).unwrap(), 1);
        assert_eq!(
            other
                .get_global_config_value(config_keys::MAX_ROWS)
                .unwrap()
                .as_deref(),
            Some("1000")
        );
    }
}
