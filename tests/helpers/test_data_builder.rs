// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::{NaiveDate, Utc};

use dlvery::domain::delivery::Delivery;
use dlvery::domain::inventory::InventoryItemInput;
use dlvery::domain::types::{ConditionType, DeliveryStatus};

// ==========================================
// InventoryItemInput 构建器
// ==========================================

pub struct ItemBuilder {
    input: InventoryItemInput,
}

impl ItemBuilder {
    pub fn new(sku: &str) -> Self {
        Self {
            input: InventoryItemInput::new(sku, "General", 10),
        }
    }

    pub fn category(mut self, category: &str) -> Self {
        self.input.category = category.to_string();
        self
    }

    pub fn quantity(mut self, quantity: i64) -> Self {
        self.input.quantity = quantity;
        self
    }

    pub fn perishable(mut self) -> Self {
        self.input.perishable = true;
        self
    }

    pub fn damaged(mut self) -> Self {
        self.input.damaged = true;
        self
    }

    pub fn expiry(mut self, date: NaiveDate) -> Self {
        self.input.expiry = Some(date);
        self
    }

    pub fn build(self) -> InventoryItemInput {
        self.input
    }
}

// ==========================================
// Delivery 构建器
// ==========================================

pub struct DeliveryBuilder {
    sku: String,
    name: String,
    agent: String,
    quantity: i64,
    status: DeliveryStatus,
    perishable: bool,
    damaged: bool,
    condition_type: Option<ConditionType>,
    delivery_date: Option<NaiveDate>,
}

impl DeliveryBuilder {
    pub fn new(sku: &str, agent: &str) -> Self {
        Self {
            sku: sku.to_string(),
            name: "General".to_string(),
            agent: agent.to_string(),
            quantity: 1,
            status: DeliveryStatus::Pending,
            perishable: false,
            damaged: false,
            condition_type: None,
            delivery_date: None,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn status(mut self, status: DeliveryStatus) -> Self {
        self.status = status;
        self
    }

    pub fn perishable(mut self) -> Self {
        self.perishable = true;
        self
    }

    pub fn damaged(mut self) -> Self {
        self.damaged = true;
        self
    }

    /// 显式指定 type（默认由标记推导）
    pub fn condition_type(mut self, condition_type: ConditionType) -> Self {
        self.condition_type = Some(condition_type);
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.delivery_date = Some(date);
        self
    }

    pub fn build(self) -> Delivery {
        Delivery {
            id: String::new(),
            sku: self.sku,
            name: self.name,
            agent: self.agent,
            quantity: self.quantity,
            status: self.status,
            condition_type: self
                .condition_type
                .unwrap_or_else(|| ConditionType::from_flags(self.perishable, self.damaged)),
            perishable: self.perishable,
            damaged: self.damaged,
            delivery_date: self.delivery_date,
            created_at: Utc::now(),
            delivered_quantity: 0,
            delivered_at: None,
        }
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("日期格式错误")
}
