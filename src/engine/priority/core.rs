use crate::domain::delivery::Delivery;
use crate::domain::types::ConditionType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// DateBucket - 日期分桶
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateBucket {
    Past,
    Today,
    Upcoming,
}

// ==========================================
// DeliveryQueue - 分桶后的配送队列
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryQueue {
    pub past: Vec<Delivery>,
    pub today: Vec<Delivery>,
    pub upcoming: Vec<Delivery>,
}

impl DeliveryQueue {
    pub fn len(&self) -> usize {
        self.past.len() + self.today.len() + self.upcoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 是否包含指定配送单
    pub fn contains(&self, delivery_id: &str) -> bool {
        self.past
            .iter()
            .chain(&self.today)
            .chain(&self.upcoming)
            .any(|d| d.id == delivery_id)
    }
}

// ==========================================
// DeliveryPrioritizer - 队列优先级引擎
// ==========================================
pub struct DeliveryPrioritizer {
    // 无状态引擎,不需要注入依赖
}

impl DeliveryPrioritizer {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 评分
    // ==========================================

    /// 优先级分值（越小越优先）
    ///
    /// 标记与 type 任一命中即算：易腐 1，破损 2，普通 3
    pub fn priority_score(&self, delivery: &Delivery) -> u8 {
        match self.priority_type(delivery) {
            ConditionType::Perishable => 1,
            ConditionType::Damaged => 2,
            ConditionType::Normal => 3,
        }
    }

    /// 用于展示的优先级类型
    pub fn priority_type(&self, delivery: &Delivery) -> ConditionType {
        if delivery.is_perishable() {
            ConditionType::Perishable
        } else if delivery.is_damaged() {
            ConditionType::Damaged
        } else {
            ConditionType::Normal
        }
    }

    // ==========================================
    // 分桶
    // ==========================================

    /// 单张配送单所属日期桶；无配送日期归入今日
    pub fn bucket_of(&self, delivery: &Delivery, today: NaiveDate) -> DateBucket {
        match delivery.delivery_date {
            None => DateBucket::Today,
            Some(date) if date < today => DateBucket::Past,
            Some(date) if date == today => DateBucket::Today,
            Some(_) => DateBucket::Upcoming,
        }
    }

    /// 分桶并对每个桶排序
    ///
    /// 纯函数：同一输入与 `today` 总得到相同结果
    pub fn group_by_date(&self, deliveries: &[Delivery], today: NaiveDate) -> DeliveryQueue {
        let mut queue = DeliveryQueue::default();
        for delivery in deliveries {
            let bucket = match self.bucket_of(delivery, today) {
                DateBucket::Past => &mut queue.past,
                DateBucket::Today => &mut queue.today,
                DateBucket::Upcoming => &mut queue.upcoming,
            };
            bucket.push(delivery.clone());
        }

        queue.past = self.sort(queue.past);
        queue.today = self.sort(queue.today);
        queue.upcoming = self.sort(queue.upcoming);
        queue
    }

    // ==========================================
    // 排序
    // ==========================================

    /// 桶内排序
    ///
    /// 排序键:
    /// 1) 优先级分值升序（易腐 → 破损 → 普通，与日期无关）
    /// 2) 同分值内，有日期的配送单按日期升序占据原有日期位置
    /// 3) 无日期的配送单保持原相对位置
    pub fn sort(&self, mut deliveries: Vec<Delivery>) -> Vec<Delivery> {
        deliveries.sort_by_key(|d| self.priority_score(d));

        let mut start = 0;
        while start < deliveries.len() {
            let score = self.priority_score(&deliveries[start]);
            let end = deliveries[start..]
                .iter()
                .position(|d| self.priority_score(d) != score)
                .map_or(deliveries.len(), |offset| start + offset);
            order_dated_slots(&mut deliveries[start..end]);
            start = end;
        }
        deliveries
    }
}

impl Default for DeliveryPrioritizer {
    fn default() -> Self {
        Self::new()
    }
}

/// 同分值区段内，只在有日期的位置之间按日期稳定重排
fn order_dated_slots(run: &mut [Delivery]) {
    let slots: Vec<usize> = run
        .iter()
        .enumerate()
        .filter(|(_, d)| d.delivery_date.is_some())
        .map(|(i, _)| i)
        .collect();
    if slots.len() < 2 {
        return;
    }

    let mut dated: Vec<Delivery> = slots.iter().map(|&i| run[i].clone()).collect();
    dated.sort_by_key(|d| d.delivery_date);
    for (slot, delivery) in slots.into_iter().zip(dated) {
        run[slot] = delivery;
    }
}
