// ==========================================
// DLVery 库存配送协同系统 - 货品状况推导
// ==========================================
// 红线: type 只通过 ConditionType::from_flags 推导
// 职责: 状况推导的统一入口；两次快照间的状况变化检测（配送员提示）
// ==========================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::delivery::Delivery;
use crate::domain::types::ConditionType;

/// 由标记推导 type
pub fn derive_type(perishable: bool, damaged: bool) -> ConditionType {
    ConditionType::from_flags(perishable, damaged)
}

/// 单张配送单的状况变化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionChange {
    pub delivery_id: String,
    pub sku: String,
    pub previous: ConditionType,
    pub current: ConditionType,
    pub perishable: bool,
    pub damaged: bool,
}

/// 比较两个快照，找出 type / perishable / damaged 有变化的配送单
///
/// 只报告两边都存在的配送单；输出顺序跟随 `next`
pub fn detect_condition_changes(previous: &[Delivery], next: &[Delivery]) -> Vec<ConditionChange> {
    let before: HashMap<&str, &Delivery> = previous.iter().map(|d| (d.id.as_str(), d)).collect();

    next.iter()
        .filter_map(|cur| {
            let old = before.get(cur.id.as_str())?;
            let changed = old.condition_type != cur.condition_type
                || old.perishable != cur.perishable
                || old.damaged != cur.damaged;
            changed.then(|| ConditionChange {
                delivery_id: cur.id.clone(),
                sku: cur.sku.clone(),
                previous: old.condition_type,
                current: cur.condition_type,
                perishable: cur.perishable,
                damaged: cur.damaged,
            })
        })
        .collect()
}
