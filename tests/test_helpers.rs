// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、CSV 文件生成等功能
// ==========================================

#![allow(dead_code)]

use std::error::Error;
use std::io::Write;
use tempfile::NamedTempFile;
use wareflow_import::config::ConfigManager;
use wareflow_import::db::open_and_init;
use wareflow_import::ImportApi;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是合法 UTF-8")?
        .to_string();

    open_and_init(&db_path)?;

    Ok((temp_file, db_path))
}

/// 写入临时 CSV 文件
///
/// # 返回
/// - NamedTempFile: 扩展名为 .csv 的临时文件（需要保持存活）
pub fn write_temp_csv(content: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile()?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.flush()?;
    Ok(temp_file)
}

/// 路径转字符串
pub fn path_str(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().to_string()
}

/// 在测试库中写入全局配置
pub fn insert_test_config(db_path: &str, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let config = ConfigManager::new(db_path)?;
    config.set_global_config_value(key, value)?;
    Ok(())
}

/// 创建基于文件数据库的 ImportApi
pub fn create_test_api(db_path: &str) -> ImportApi {
    ImportApi::new(db_path).expect("Failed to create ImportApi")
}

/// 生成 N 行合法商品数据（SKU-0001 …）
pub fn generate_valid_csv(rows: usize) -> String {
    let mut content = String::from("SKU,Name,Quantity,Category\n");
    for i in 1..=rows {
        content.push_str(&format!("SKU-{:04},Item {},{},Parts\n", i, i, i * 3));
    }
    content
}
