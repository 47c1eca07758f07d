// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 基于临时数据库装配完整 AppState，并提供数据准备方法
// ==========================================

use std::sync::Arc;

use serde_json::json;
use tempfile::NamedTempFile;

use dlvery::app::AppState;
use dlvery::domain::delivery::Delivery;
use dlvery::domain::inventory::InventoryItemInput;
use dlvery::domain::session::AgentSession;
use dlvery::repository::{DeliveryRepository, InventoryRepository, VerificationRepository};
use dlvery::store::{into_document, Collection, DocumentStore};

use crate::test_helpers;

/// 默认配送员
pub const AGENT_A: &str = "alice@dlvery.test";
pub const AGENT_B: &str = "bob@dlvery.test";

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含完整装配的 AppState 与用于数据准备/断言的仓储
pub struct ApiTestEnv {
    pub db_path: String,
    pub state: AppState,

    // Repository层（用于测试数据准备与断言）
    pub inventory_repo: Arc<InventoryRepository>,
    pub delivery_repo: Arc<DeliveryRepository>,
    pub verification_repo: Arc<VerificationRepository>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 创建新的API测试环境（已写入两个配送员和一个库存组用户）
    pub fn new() -> Result<Self, String> {
        let (temp_file, db_path) = test_helpers::create_test_db()
            .map_err(|e| format!("创建测试数据库失败: {}", e))?;

        let state = AppState::new(db_path.clone())
            .map_err(|e| format!("无法初始化AppState: {}", e))?;

        let env = Self {
            db_path,
            inventory_repo: Arc::new(InventoryRepository::new(state.store.clone())),
            delivery_repo: Arc::new(DeliveryRepository::new(state.store.clone())),
            verification_repo: state.verification_repo.clone(),
            state,
            _temp_file: temp_file,
        };

        env.add_user(AGENT_A, "DLTeam")?;
        env.add_user(AGENT_B, "DLTeam")?;
        env.add_user("stock@dlvery.test", "InvTeam")?;
        Ok(env)
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.state.store.clone()
    }

    pub fn add_user(&self, email: &str, role: &str) -> Result<String, String> {
        self.state
            .store
            .create(
                Collection::Users,
                into_document(json!({ "email": email, "role": role })),
            )
            .map_err(|e| format!("写入用户失败: {}", e))
    }

    /// 通过 API 新建库存
    pub fn add_item(&self, input: InventoryItemInput) -> String {
        self.state
            .inventory_api
            .create_item(&input)
            .expect("新建库存失败")
    }

    /// 绕过派送直接写入配送单（用于构造任意状态）
    pub fn insert_delivery(&self, delivery: &Delivery) -> String {
        self.delivery_repo.insert(delivery).expect("写入配送单失败")
    }

    /// 通过 API 派送
    pub fn dispatch(&self, item_id: &str, agent: &str, quantity: i64, date: &str) -> Delivery {
        self.state
            .inventory_api
            .send_for_delivery(item_id, agent, quantity, date)
            .expect("派送失败")
    }

    pub fn session(&self, agent: &str) -> AgentSession {
        self.state.agent_api.login(agent).expect("登录失败")
    }

    pub fn delivery_count(&self) -> usize {
        self.delivery_repo.list_all().expect("读取配送单失败").len()
    }

    pub fn inventory_count(&self) -> usize {
        self.inventory_repo.list_all().expect("读取库存失败").len()
    }
}
