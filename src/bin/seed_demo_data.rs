// ==========================================
// DLVery 库存配送协同系统 - 演示数据生成
// ==========================================
// 用法: seed_demo_data [db_path]
// 已有数据库会先备份为 {db_path}.bak.{时间戳} 再重建
// ==========================================

use std::fs;
use std::path::Path;

use chrono::{Duration, Local};
use serde_json::json;

use dlvery::app::{get_default_db_path, AppState};
use dlvery::domain::delivery::DeliveryFilter;
use dlvery::domain::types::{ConditionField, DeliveryStatus};
use dlvery::store::{into_document, Collection};
use dlvery::InventoryItemInput;

const AGENTS: [&str; 3] = ["alice@dlvery.test", "bob@dlvery.test", "carol@dlvery.test"];
const INVENTORY_STAFF: &str = "stock@dlvery.test";

fn main() -> anyhow::Result<()> {
    dlvery::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let state = AppState::new(db_path.clone())?;
    seed_users(&state)?;
    seed_inventory_and_deliveries(&state)?;
    print_quick_counts(&state)?;

    eprintln!("Seeded demo data into {}", db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> anyhow::Result<()> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_users(state: &AppState) -> anyhow::Result<()> {
    for email in AGENTS {
        state.store.create(
            Collection::Users,
            into_document(json!({ "email": email, "role": "DLTeam" })),
        )?;
    }
    state.store.create(
        Collection::Users,
        into_document(json!({ "email": INVENTORY_STAFF, "role": "InvTeam" })),
    )?;
    Ok(())
}

fn seed_inventory_and_deliveries(state: &AppState) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let api = &state.inventory_api;

    let items = [
        InventoryItemInput::new("MILK-1L", "Dairy", 40)
            .perishable(true)
            .expiry(today + Duration::days(5)),
        InventoryItemInput::new("EGG-12", "Eggs", 25)
            .perishable(true)
            .expiry(today + Duration::days(12)),
        InventoryItemInput::new("TV-55", "Electronics", 6).damaged(true),
        InventoryItemInput::new("RICE-5KG", "Grocery", 80),
        InventoryItemInput::new("LAMP-01", "Home", 14),
        InventoryItemInput::new("CHAIR-02", "Furniture", 9),
    ];

    let mut ids = Vec::with_capacity(items.len());
    for item in &items {
        ids.push(api.create_item(item)?);
    }

    // 派送后库存条目即被删除，每个条目最多派送一次
    let plan = [
        (0, AGENTS[0], 10, today - Duration::days(1)),
        (1, AGENTS[0], 12, today),
        (2, AGENTS[0], 2, today),
        (3, AGENTS[1], 20, today + Duration::days(2)),
        (4, AGENTS[1], 3, today),
    ];
    for (idx, agent, quantity, date) in plan {
        let date = date.format("%Y-%m-%d").to_string();
        api.send_for_delivery(&ids[idx], agent, quantity, &date)?;
    }

    // 把一条配送单推进到运输中，并给剩余库存打一个状况标记
    let deliveries = state
        .delivery_console_api
        .list_deliveries(&DeliveryFilter::default())?;
    if let Some(first) = deliveries.iter().find(|d| d.sku == "RICE-5KG") {
        state
            .delivery_console_api
            .change_status(&first.id, DeliveryStatus::InTransit)?;
    }
    api.toggle_condition(&ids[5], ConditionField::Damaged)?;

    Ok(())
}

fn print_quick_counts(state: &AppState) -> anyhow::Result<()> {
    let items = state.inventory_api.list_items()?;
    let deliveries = state
        .delivery_console_api
        .list_deliveries(&DeliveryFilter::default())?;
    let logs = state.action_log_repo.count()?;

    eprintln!("Row counts:");
    eprintln!("  inventory: {}", items.len());
    eprintln!("  deliveries: {}", deliveries.len());
    eprintln!("  action_log: {}", logs);
    Ok(())
}
