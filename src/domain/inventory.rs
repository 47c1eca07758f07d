// ==========================================
// DLVery 库存配送协同系统 - 库存领域模型
// ==========================================
// 集合: inventory
// 生命周期: 库存组新建/编辑 → 派送时整条删除 → 退回时由配送单快照重建
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// InventoryItem - 库存条目
// ==========================================
// 说明: sku 为业务键，但存储层不保证唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub sku: String,
    pub category: String,
    pub quantity: i64,            // ≥ 0，缺失按 0
    pub perishable: bool,
    pub damaged: bool,
    pub expiry: Option<NaiveDate>, // 空字符串/缺失 → None
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// InventoryItemInput - 新建/编辑/导入输入
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemInput {
    pub sku: String,
    pub category: String,
    pub quantity: i64,
    pub perishable: bool,
    pub damaged: bool,
    pub expiry: Option<NaiveDate>,
}

impl InventoryItemInput {
    pub fn new(sku: &str, category: &str, quantity: i64) -> Self {
        Self {
            sku: sku.to_string(),
            category: category.to_string(),
            quantity,
            ..Default::default()
        }
    }

    pub fn perishable(mut self, value: bool) -> Self {
        self.perishable = value;
        self
    }

    pub fn damaged(mut self, value: bool) -> Self {
        self.damaged = value;
        self
    }

    pub fn expiry(mut self, date: NaiveDate) -> Self {
        self.expiry = Some(date);
        self
    }
}

// ==========================================
// InventoryFilter - 库存列表筛选
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryFilter {
    /// 关键字：sku 或 category 包含（不区分大小写）
    pub search: Option<String>,
    /// 三态：None 不过滤
    pub perishable: Option<bool>,
    pub damaged: Option<bool>,
    /// 有效期不晚于该日期（无有效期的条目被排除）
    pub expiry_before: Option<NaiveDate>,
}

impl InventoryFilter {
    pub fn matches(&self, item: &InventoryItem) -> bool {
        let search_match = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                item.sku.to_lowercase().contains(&term)
                    || item.category.to_lowercase().contains(&term)
            }
        };
        let perishable_match = self.perishable.map_or(true, |p| item.perishable == p);
        let damaged_match = self.damaged.map_or(true, |d| item.damaged == d);
        let expiry_match = match self.expiry_before {
            None => true,
            Some(limit) => item.expiry.map_or(false, |e| e <= limit),
        };

        search_match && perishable_match && damaged_match && expiry_match
    }
}

// ==========================================
// ImportSummary - 批量导入结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
    pub errors: usize,
}
