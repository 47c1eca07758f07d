// ==========================================
// DLVery 库存配送协同系统 - 配送单数据仓储
// ==========================================
// 集合: deliveries
// 红线: Repository 不做业务逻辑,只做文档映射与字段归一化
// 读取缺省: status 缺失/未知 → pending；type 缺失/未知 → 由标记推导
// ==========================================

use std::sync::Arc;

use serde_json::json;

use crate::domain::delivery::Delivery;
use crate::domain::types::{ConditionField, ConditionType, DeliveryStatus};
use crate::repository::normalize::{
    bool_field, date_field, format_date, format_timestamp, int_field, opt_timestamp_field,
    str_field, timestamp_field,
};
use crate::store::{
    into_document, Collection, Document, DocumentQuery, DocumentStore, FieldFilter, OrderBy,
    StoreResult, StoredDocument, Subscription, WriteOp,
};

// ==========================================
// DeliveryRepository - 配送单仓储
// ==========================================
pub struct DeliveryRepository {
    store: Arc<dyn DocumentStore>,
}

impl DeliveryRepository {
    /// 创建新的配送单仓储
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 ID 查询
    pub fn find_by_id(&self, id: &str) -> StoreResult<Option<Delivery>> {
        Ok(self
            .store
            .get(Collection::Deliveries, id)?
            .and_then(|doc| Self::map_document(&doc)))
    }

    /// 查询全部配送单（按 createdAt 倒序）
    pub fn list_all(&self) -> StoreResult<Vec<Delivery>> {
        let docs = self.store.get_all(&Self::all_query())?;
        Ok(Self::map_snapshot(&docs))
    }

    /// 全量扫描，返回 sku 相等的配送单
    ///
    /// 不分页，假定全部在途配送单可一次读入
    pub fn find_by_sku(&self, sku: &str) -> StoreResult<Vec<Delivery>> {
        let docs = self
            .store
            .get_all(&DocumentQuery::all(Collection::Deliveries))?;
        Ok(Self::map_snapshot(&docs)
            .into_iter()
            .filter(|d| d.sku == sku)
            .collect())
    }

    /// 订阅全部配送单（createdAt 倒序）
    pub fn subscribe_all(&self) -> StoreResult<Subscription> {
        self.store.subscribe(Self::all_query())
    }

    /// 订阅某配送员的配送单（createdAt 倒序）
    pub fn subscribe_for_agent(&self, agent: &str) -> StoreResult<Subscription> {
        self.store.subscribe(Self::agent_query(agent))
    }

    pub fn all_query() -> DocumentQuery {
        DocumentQuery::all(Collection::Deliveries).order_by(OrderBy::desc("createdAt"))
    }

    pub fn agent_query(agent: &str) -> DocumentQuery {
        DocumentQuery::all(Collection::Deliveries)
            .filter(FieldFilter::eq("agent", agent))
            .order_by(OrderBy::desc("createdAt"))
    }

    // ==========================================
    // 批量写操作构造
    // ==========================================

    /// 新建配送单（delivery.id 被忽略，由存储生成）
    pub fn create_op(delivery: &Delivery) -> WriteOp {
        WriteOp::Create {
            collection: Collection::Deliveries,
            doc: Self::to_document(delivery),
        }
    }

    /// 仅更新状态字段
    pub fn status_op(id: &str, status: DeliveryStatus) -> WriteOp {
        WriteOp::Update {
            collection: Collection::Deliveries,
            id: id.to_string(),
            patch: into_document(json!({ "status": status.to_db_str() })),
        }
    }

    pub fn delete_op(id: &str) -> WriteOp {
        WriteOp::Delete {
            collection: Collection::Deliveries,
            id: id.to_string(),
        }
    }

    /// 单个状况标记 + 重新推导的 type
    pub fn condition_op(
        id: &str,
        field: ConditionField,
        value: bool,
        condition_type: ConditionType,
    ) -> WriteOp {
        let mut patch = Document::new();
        patch.insert(field.field_name().to_string(), json!(value));
        patch.insert("type".to_string(), json!(condition_type.to_db_str()));
        WriteOp::Update {
            collection: Collection::Deliveries,
            id: id.to_string(),
            patch,
        }
    }

    /// type 与两个标记整体写入
    pub fn type_op(id: &str, condition_type: ConditionType) -> WriteOp {
        let (perishable, damaged) = condition_type.flags();
        WriteOp::Update {
            collection: Collection::Deliveries,
            id: id.to_string(),
            patch: into_document(json!({
                "type": condition_type.to_db_str(),
                "perishable": perishable,
                "damaged": damaged,
            })),
        }
    }

    // ==========================================
    // 映射
    // ==========================================

    pub fn to_document(delivery: &Delivery) -> Document {
        into_document(json!({
            "sku": delivery.sku,
            "name": delivery.name,
            "agent": delivery.agent,
            "quantity": delivery.quantity,
            "status": delivery.status.to_db_str(),
            "type": delivery.condition_type.to_db_str(),
            "perishable": delivery.perishable,
            "damaged": delivery.damaged,
            "deliveryDate": delivery.delivery_date.as_ref().map(format_date).unwrap_or_default(),
            "createdAt": format_timestamp(&delivery.created_at),
            "deliveredQuantity": delivery.delivered_quantity,
            "deliveredAt": delivery.delivered_at.as_ref().map(format_timestamp),
        }))
    }

    /// 存储文档 → 实体（无 ID 的文档丢弃）
    pub fn map_document(doc: &StoredDocument) -> Option<Delivery> {
        if doc.id.is_empty() {
            tracing::warn!(collection = "deliveries", "丢弃无 ID 文档");
            return None;
        }
        let data = &doc.data;
        let perishable = bool_field(data, "perishable");
        let damaged = bool_field(data, "damaged");

        let status = DeliveryStatus::parse(&str_field(data, "status")).unwrap_or_else(|| {
            if data.contains_key("status") {
                tracing::warn!(delivery_id = %doc.id, "未知配送状态，按 pending 处理");
            }
            DeliveryStatus::Pending
        });
        let condition_type = ConditionType::parse(&str_field(data, "type"))
            .unwrap_or_else(|| ConditionType::from_flags(perishable, damaged));

        Some(Delivery {
            id: doc.id.clone(),
            sku: str_field(data, "sku"),
            name: str_field(data, "name"),
            agent: str_field(data, "agent"),
            quantity: int_field(data, "quantity"),
            status,
            condition_type,
            perishable,
            damaged,
            delivery_date: date_field(data, "deliveryDate"),
            created_at: timestamp_field(data, "createdAt"),
            delivered_quantity: int_field(data, "deliveredQuantity"),
            delivered_at: opt_timestamp_field(data, "deliveredAt"),
        })
    }

    /// 快照 → 实体列表（保持快照顺序）
    pub fn map_snapshot(docs: &[StoredDocument]) -> Vec<Delivery> {
        docs.iter().filter_map(Self::map_document).collect()
    }

    /// 直接以 ID 删除（仅用于测试夹具与维护脚本）
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete(Collection::Deliveries, id)
    }

    /// 写入一张配送单，返回新 ID
    pub fn insert(&self, delivery: &Delivery) -> StoreResult<String> {
        self.store
            .create(Collection::Deliveries, Self::to_document(delivery))
    }
}
