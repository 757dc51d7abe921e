// ==========================================
// BI 管理后台 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取落库并发度
    ///
    /// # 默认值
    /// - 1（逐行顺序写入）
    ///
    /// # 说明
    /// - 取值范围 1..=32，越界会被截断
    async fn get_insert_concurrency(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    /// 获取 CSV 分隔符
    ///
    /// # 默认值
    /// - ','
    ///
    /// # 说明
    /// - 必须是单个 ASCII 字符；"\t" 表示制表符
    async fn get_csv_delimiter(&self) -> Result<u8, Box<dyn Error + Send + Sync>>;

    /// 获取单文件最大数据行数
    ///
    /// # 默认值
    /// - 0（不限）
    async fn get_max_rows(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;
}
