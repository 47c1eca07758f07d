// ==========================================
// DLVery 库存配送协同系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 集合文档 ↔ 领域实体映射（读取时归一化），批量写操作构造
// 约束: 跨文档写入只构造 WriteOp，由引擎层组批提交
// ==========================================

pub mod action_log_repo;
pub mod delivery_repo;
pub mod inventory_repo;
pub mod normalize;
pub mod user_repo;
pub mod verification_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use delivery_repo::DeliveryRepository;
pub use inventory_repo::InventoryRepository;
pub use user_repo::UserRepository;
pub use verification_repo::VerificationRepository;
