// ==========================================
// BI 管理后台 - 数据导入命令行入口
// ==========================================
// 用法:
//   bi-import formats
//   bi-import import <format_id> <file> [db_path]
// 结果以 JSON 输出到 stdout，日志输出到 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use bi_import::app::{get_default_db_path, AppState};

const USAGE: &str = "用法:\n  bi-import formats\n  bi-import import <format_id> <file> [db_path]";

#[tokio::main]
async fn main() -> Result<()> {
    bi_import::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str);

    match command {
        Some("formats") => {
            let state = AppState::new(resolve_db_path(None)).map_err(anyhow::Error::msg)?;
            let formats = state.import_api.list_formats();
            println!("{}", serde_json::to_string_pretty(&formats)?);
        }
        Some("import") => {
            let (format_id, file) = match (args.get(1), args.get(2)) {
                (Some(format_id), Some(file)) => (format_id, file),
                _ => bail!("参数不足\n{}", USAGE),
            };

            tracing::info!("{} v{}", bi_import::APP_NAME, bi_import::VERSION);

            let db_path = resolve_db_path(args.get(3).cloned());
            tracing::info!("使用数据库: {}", db_path);

            let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;
            let response = state
                .import_api
                .import_file(file, format_id)
                .await
                .with_context(|| format!("导入失败: {}", file))?;

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        _ => bail!("{}", USAGE),
    }

    Ok(())
}

fn resolve_db_path(arg: Option<String>) -> String {
    arg.filter(|p| !p.trim().is_empty())
        .unwrap_or_else(get_default_db_path)
}
