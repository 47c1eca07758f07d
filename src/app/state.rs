// ==========================================
// DLVery 库存配送协同系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 连接: 文档存储、操作日志、配置共用一个 SQLite 连接
// ==========================================

use std::sync::Arc;

use crate::api::{AgentApi, DeliveryConsoleApi, InventoryApi};
use crate::app::live_view::LiveView;
use crate::app::session_store::SessionStore;
use crate::config::ConfigManager;
use crate::domain::delivery::Delivery;
use crate::domain::inventory::InventoryItem;
use crate::domain::session::AgentSession;
use crate::engine::{ConsistencyEngine, DeliveryLifecycle, DeliveryPrioritizer};
use crate::repository::{
    ActionLogRepository, DeliveryRepository, InventoryRepository, UserRepository,
    VerificationRepository,
};
use crate::store::{DocumentStore, SqliteDocumentStore, StoreResult};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径（内存库为 ":memory:"）
    pub db_path: String,

    /// 集合存储
    pub store: Arc<dyn DocumentStore>,

    /// 库存组API
    pub inventory_api: Arc<InventoryApi>,

    /// 全部配送单控制台API
    pub delivery_console_api: Arc<DeliveryConsoleApi>,

    /// 配送员API
    pub agent_api: Arc<AgentApi>,

    /// 签收凭证仓储（只读查询）
    pub verification_repo: Arc<VerificationRepository>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 打开数据库（含建表），按配置重设 busy_timeout，然后装配仓储/引擎/API
    pub fn new(db_path: String) -> StoreResult<Self> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);
        let store = SqliteDocumentStore::new(&db_path)?;
        Self::assemble(db_path, store)
    }

    /// 内存库（测试/演示）
    pub fn in_memory() -> StoreResult<Self> {
        Self::assemble(":memory:".to_string(), SqliteDocumentStore::in_memory()?)
    }

    fn assemble(db_path: String, store: SqliteDocumentStore) -> StoreResult<Self> {
        let conn = store.connection();
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));

        let busy_timeout_ms = config_manager.busy_timeout_ms()?;
        if busy_timeout_ms != crate::db::DEFAULT_BUSY_TIMEOUT_MS {
            let guard = conn
                .lock()
                .map_err(|e| crate::store::StoreError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection_with_timeout(&guard, busy_timeout_ms)?;
        }

        let store: Arc<dyn DocumentStore> = Arc::new(store);

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let inventory_repo = Arc::new(InventoryRepository::new(store.clone()));
        let delivery_repo = Arc::new(DeliveryRepository::new(store.clone()));
        let user_repo = Arc::new(UserRepository::new(store.clone()));
        let verification_repo = Arc::new(VerificationRepository::new(store.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn));

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let consistency_engine = Arc::new(ConsistencyEngine::new(store.clone()));
        let lifecycle = Arc::new(DeliveryLifecycle::new(store.clone()));
        let prioritizer = Arc::new(DeliveryPrioritizer::new());

        // ==========================================
        // 初始化API层
        // ==========================================
        let inventory_api = Arc::new(InventoryApi::new(
            inventory_repo,
            delivery_repo.clone(),
            user_repo,
            action_log_repo.clone(),
            consistency_engine.clone(),
            config_manager.clone(),
        ));
        let delivery_console_api = Arc::new(DeliveryConsoleApi::new(
            delivery_repo.clone(),
            action_log_repo.clone(),
            lifecycle.clone(),
            consistency_engine,
            config_manager.clone(),
        ));
        let agent_api = Arc::new(AgentApi::new(
            store.clone(),
            delivery_repo,
            action_log_repo.clone(),
            lifecycle,
            prioritizer,
        ));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            store,
            inventory_api,
            delivery_console_api,
            agent_api,
            verification_repo,
            action_log_repo,
            config_manager,
        })
    }

    // ==========================================
    // 实时视图
    // ==========================================

    /// 库存实时视图（快照顺序为写入序，展示前按需排序）
    pub fn inventory_view(&self) -> StoreResult<LiveView<InventoryItem>> {
        let sub = InventoryRepository::new(self.store.clone()).subscribe_all()?;
        Ok(LiveView::new(sub, InventoryRepository::map_snapshot))
    }

    /// 全部配送单实时视图（createdAt 倒序）
    pub fn deliveries_view(&self) -> StoreResult<LiveView<Delivery>> {
        let sub = DeliveryRepository::new(self.store.clone()).subscribe_all()?;
        Ok(LiveView::new(sub, DeliveryRepository::map_snapshot))
    }

    /// 配送员本人配送单实时视图
    pub fn agent_view(&self, session: &AgentSession) -> StoreResult<LiveView<Delivery>> {
        let sub = self.agent_api.subscribe(session)?;
        Ok(LiveView::new(sub, DeliveryRepository::map_snapshot))
    }

    // ==========================================
    // 会话钩子
    // ==========================================

    /// 启动时恢复配送员会话
    pub fn restore_session(&self, sessions: &SessionStore) -> Option<AgentSession> {
        match sessions.load() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "会话恢复失败，按未登录处理");
                None
            }
        }
    }

    /// 登录并保存会话
    pub fn login_agent(
        &self,
        sessions: &SessionStore,
        email: &str,
    ) -> anyhow::Result<AgentSession> {
        let session = self.agent_api.login(email)?;
        sessions.save(&session)?;
        Ok(session)
    }

    /// 登出并清除会话
    pub fn logout_agent(&self, sessions: &SessionStore, session: AgentSession) -> anyhow::Result<()> {
        self.agent_api.logout(session);
        sessions.clear()
    }
}

/// 默认数据库路径
///
/// 优先使用环境变量 DLVERY_DB_PATH，其次用户数据目录，最后当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("DLVERY_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./dlvery.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("dlvery");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("dlvery.db");
        }
    }

    path.to_string_lossy().to_string()
}
