// Dev utility: clear all inventory tables (products, zones, sectors, warehouses).
//
// Usage:
//   cargo run --bin reset_inventory_db -- [db_path]
//
// Configuration (config_kv) is kept.

use wareflow_import::app::get_default_db_path;
use wareflow_import::{logging, ImportApi};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let db_path = std::env::args()
        .nth(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path);

    let api = ImportApi::new(&db_path)?;
    api.reset_inventory().await?;

    println!("reset ok: {}", db_path);
    Ok(())
}
