// ==========================================
// DLVery 库存配送协同系统 - 配送队列优先级引擎
// ==========================================
// 职责: 配送员当日队列的分桶（过期/今日/未来）与桶内排序
// 输入: 配送员的在途配送单快照 + 今日日期
// 输出: DeliveryQueue
// ==========================================

mod core;


pub use core::{DateBucket, DeliveryPrioritizer, DeliveryQueue};
