// ==========================================
// DLVery 库存配送协同系统 - 引擎层
// ==========================================
// 职责: 实现跨集合一致性规则、配送单状态机、队列优先级
// 红线: Engine 不拼 SQL；每个逻辑操作映射为一个原子批次
// ==========================================

pub mod condition;
pub mod consistency;
pub mod error;
pub mod lifecycle;
pub mod priority;

// 重导出核心引擎
pub use condition::{derive_type, detect_condition_changes, ConditionChange};
pub use consistency::{ConsistencyEngine, ToggleOutcome};
pub use error::{EngineError, EngineResult};
pub use lifecycle::{
    check_transition, DeliveryConfirmation, DeliveryLifecycle, TransitionKind, TransitionOutcome,
};
pub use priority::{DateBucket, DeliveryPrioritizer, DeliveryQueue};
