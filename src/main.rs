// ==========================================
// Wareflow 仓储管理 - 命令行导入入口
// ==========================================
// 用法: wareflow-import <file.csv> [db_path]
// 流程: 解析 → 推断映射 → 校验（输出问题）→ 校验通过时提交
// 输出: stdout 为 JSON 结果，日志写 stderr
// ==========================================

use serde_json::json;
use wareflow_import::app::get_default_db_path;
use wareflow_import::{logging, ImportApi};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // WAREFLOW_LOG_JSON=1 时输出 JSON 日志
    if std::env::var_os("WAREFLOW_LOG_JSON").is_some() {
        logging::init_json();
    } else {
        logging::init();
    }

    let mut args = std::env::args().skip(1);
    let file_path = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: wareflow-import <file.csv> [db_path]"))?;
    let db_path = args.next().unwrap_or_else(get_default_db_path);

    tracing::info!("==================================================");
    tracing::info!("{} 导入工具 v{}", wareflow_import::APP_NAME, wareflow_import::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let api = ImportApi::new(&db_path)?;

    let parsed = api.parse_file(&file_path).await?;
    let mapping = api.infer_mapping(&parsed.headers);
    let validation = api.validate(&parsed.rows, &mapping);

    for issue in &validation.errors {
        tracing::error!(row = issue.row, field = %issue.field, "{}", issue.message);
    }
    for issue in &validation.warnings {
        tracing::warn!(row = issue.row, field = %issue.field, "{}", issue.message);
    }

    let is_valid = validation.is_valid;
    let commit = if is_valid {
        Some(api.commit(&parsed.rows, &mapping).await?)
    } else {
        tracing::warn!(errors = validation.error_count(), "校验未通过，未执行提交");
        None
    };

    let output = json!({
        "file_name": parsed.file_name,
        "headers": parsed.headers,
        "row_count": parsed.row_count(),
        "mapping": mapping,
        "validation": validation,
        "commit": commit,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    if !is_valid {
        std::process::exit(2);
    }
    Ok(())
}
