// ==========================================
// DLVery 库存配送协同系统 - 命令行入口
// ==========================================
// 用法:
//   dlvery [summary] [db_path]          库存/配送概览
//   dlvery queue <agent_email> [db_path] 配送员今日队列
//   dlvery login <agent_email>          保存配送员会话
//   dlvery logout                       清除配送员会话
// ==========================================

use std::collections::BTreeMap;

use anyhow::{bail, Context};

use dlvery::app::{get_default_db_path, AppState, SessionStore};
use dlvery::domain::delivery::DeliveryFilter;
use dlvery::domain::session::AgentSession;
use dlvery::engine::DeliveryQueue;
use dlvery::Delivery;

fn main() -> anyhow::Result<()> {
    dlvery::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("summary");

    tracing::info!("==================================================");
    tracing::info!("{} v{}", dlvery::APP_NAME, dlvery::VERSION);
    tracing::info!("==================================================");

    match command {
        "summary" => {
            let state = open_state(args.get(1))?;
            print_summary(&state)
        }
        "queue" => {
            let sessions = SessionStore::default_location();
            let state = open_state(args.get(2))?;
            let session = match args.get(1) {
                Some(email) => AgentSession::new(email),
                None => state.restore_session(&sessions),
            };
            let Some(session) = session else {
                bail!("未指定配送员邮箱，且没有已保存的会话");
            };
            print_queue(&state, &session)
        }
        "login" => {
            let Some(email) = args.get(1) else {
                bail!("用法: dlvery login <agent_email>");
            };
            let state = open_state(None)?;
            let sessions = SessionStore::default_location();
            let session = state.login_agent(&sessions, email)?;
            println!("已登录: {} ({})", session.agent_email, sessions.path().display());
            Ok(())
        }
        "logout" => {
            let state = open_state(None)?;
            let sessions = SessionStore::default_location();
            if let Some(session) = state.restore_session(&sessions) {
                state.logout_agent(&sessions, session)?;
            } else {
                sessions.clear()?;
            }
            println!("已登出");
            Ok(())
        }
        other => bail!("未知命令: {}", other),
    }
}

fn open_state(db_path: Option<&String>) -> anyhow::Result<AppState> {
    let db_path = db_path.cloned().unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);
    AppState::new(db_path.clone()).with_context(|| format!("无法初始化AppState: {}", db_path))
}

fn print_summary(state: &AppState) -> anyhow::Result<()> {
    let items = state.inventory_api.list_items()?;
    let deliveries = state
        .delivery_console_api
        .list_deliveries(&DeliveryFilter::default())?;

    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    for d in &deliveries {
        *by_status.entry(d.status.to_string()).or_default() += 1;
    }

    println!("库存: {} 条", items.len());
    for item in &items {
        println!(
            "  {:<12} {:<16} 数量 {:>5}  易腐 {:<5} 破损 {}",
            item.sku, item.category, item.quantity, item.perishable, item.damaged
        );
    }

    println!("配送单: {} 条", deliveries.len());
    for (status, count) in &by_status {
        println!("  {:<12} {}", status, count);
    }
    Ok(())
}

fn print_queue(state: &AppState, session: &AgentSession) -> anyhow::Result<()> {
    let today = state.config_manager.today()?;
    let queue = state.agent_api.queue(session, today)?;

    println!("配送员: {}  日期: {}", session.agent_email, today);
    print_bucket(state, "已过期", &queue.past);
    print_bucket(state, "今日", &queue.today);
    print_bucket(state, "未来", &queue.upcoming);
    print_totals(&queue);
    Ok(())
}

fn print_bucket(state: &AppState, title: &str, deliveries: &[Delivery]) {
    println!("{} ({})", title, deliveries.len());
    for d in deliveries {
        let date = d
            .delivery_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  [{}] {:<12} {:<16} x{:<4} {:<10} {}",
            state.agent_api.priority_label(d),
            d.sku,
            d.name,
            d.quantity,
            date,
            d.status
        );
    }
}

fn print_totals(queue: &DeliveryQueue) {
    println!("合计: {}", queue.len());
}
