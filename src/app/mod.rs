// ==========================================
// DLVery 库存配送协同系统 - 应用层
// ==========================================
// 职责: 装配仓储/引擎/API，提供实时视图与会话持久化
// ==========================================

pub mod live_view;
pub mod session_store;
pub mod state;

// 重导出
pub use live_view::{LiveView, SnapshotMapper};
pub use session_store::SessionStore;
pub use state::{get_default_db_path, AppState};
