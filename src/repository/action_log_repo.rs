// ==========================================
// DLVery 库存配送协同系统 - 操作日志数据仓储
// ==========================================
// 对齐: action_log 表
// 红线: 所有逻辑操作提交后必须留痕
// ==========================================

mod core;
mod queries;


pub use core::ActionLogRepository;
