// ==========================================
// DLVery 库存配送协同系统 - 库存数据仓储
// ==========================================
// 集合: inventory
// 红线: Repository 不做业务逻辑,只做文档映射与字段归一化
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::inventory::{InventoryItem, InventoryItemInput};
use crate::domain::types::ConditionField;
use crate::repository::normalize::{
    bool_field, date_field, format_date, format_timestamp, int_field, str_field, timestamp_field,
};
use crate::store::{
    into_document, Collection, Document, DocumentQuery, DocumentStore, StoreResult,
    StoredDocument, Subscription, WriteOp,
};

// ==========================================
// InventoryRepository - 库存仓储
// ==========================================
pub struct InventoryRepository {
    store: Arc<dyn DocumentStore>,
}

impl InventoryRepository {
    /// 创建新的库存仓储
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 ID 查询
    pub fn find_by_id(&self, id: &str) -> StoreResult<Option<InventoryItem>> {
        Ok(self
            .store
            .get(Collection::Inventory, id)?
            .and_then(|doc| Self::map_document(&doc)))
    }

    /// 查询全部库存（按 createdAt 倒序）
    pub fn list_all(&self) -> StoreResult<Vec<InventoryItem>> {
        let docs = self.store.get_all(&DocumentQuery::all(Collection::Inventory))?;
        let mut items = Self::map_snapshot(&docs);
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    /// 全量扫描，返回 sku 相等的库存（不依赖索引）
    pub fn find_by_sku(&self, sku: &str) -> StoreResult<Vec<InventoryItem>> {
        let docs = self.store.get_all(&DocumentQuery::all(Collection::Inventory))?;
        Ok(Self::map_snapshot(&docs)
            .into_iter()
            .filter(|item| item.sku == sku)
            .collect())
    }

    /// 订阅整个库存集合
    pub fn subscribe_all(&self) -> StoreResult<Subscription> {
        self.store.subscribe(DocumentQuery::all(Collection::Inventory))
    }

    // ==========================================
    // 直接写入（单文档）
    // ==========================================

    /// 新建库存
    pub fn create(&self, input: &InventoryItemInput) -> StoreResult<String> {
        let now = Utc::now();
        self.store
            .create(Collection::Inventory, Self::to_document(input, now, now))
    }

    /// 编辑库存（保留 createdAt）
    pub fn update(&self, id: &str, input: &InventoryItemInput) -> StoreResult<()> {
        self.store
            .update(Collection::Inventory, id, Self::update_patch(input, Utc::now()))
    }

    /// 删除库存
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete(Collection::Inventory, id)
    }

    // ==========================================
    // 批量写操作构造
    // ==========================================

    pub fn create_op(input: &InventoryItemInput, now: DateTime<Utc>) -> WriteOp {
        WriteOp::Create {
            collection: Collection::Inventory,
            doc: Self::to_document(input, now, now),
        }
    }

    pub fn update_op(id: &str, input: &InventoryItemInput, now: DateTime<Utc>) -> WriteOp {
        WriteOp::Update {
            collection: Collection::Inventory,
            id: id.to_string(),
            patch: Self::update_patch(input, now),
        }
    }

    /// 编辑补丁：全部业务字段 + updatedAt，不含 createdAt
    fn update_patch(input: &InventoryItemInput, now: DateTime<Utc>) -> Document {
        let mut patch = Self::to_document(input, now, now);
        patch.remove("createdAt");
        patch
    }

    pub fn delete_op(id: &str) -> WriteOp {
        WriteOp::Delete {
            collection: Collection::Inventory,
            id: id.to_string(),
        }
    }

    /// 单个状况标记更新
    pub fn condition_op(id: &str, field: ConditionField, value: bool, now: DateTime<Utc>) -> WriteOp {
        let mut patch = Document::new();
        patch.insert(field.field_name().to_string(), json!(value));
        patch.insert("updatedAt".to_string(), json!(format_timestamp(&now)));
        WriteOp::Update {
            collection: Collection::Inventory,
            id: id.to_string(),
            patch,
        }
    }

    /// 两个状况标记整体更新
    pub fn flags_op(id: &str, perishable: bool, damaged: bool, now: DateTime<Utc>) -> WriteOp {
        WriteOp::Update {
            collection: Collection::Inventory,
            id: id.to_string(),
            patch: into_document(json!({
                "perishable": perishable,
                "damaged": damaged,
                "updatedAt": format_timestamp(&now),
            })),
        }
    }

    // ==========================================
    // 映射
    // ==========================================

    /// 输入 → 存储文档
    pub fn to_document(
        input: &InventoryItemInput,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Document {
        into_document(json!({
            "sku": input.sku,
            "category": input.category,
            "quantity": input.quantity,
            "perishable": input.perishable,
            "damaged": input.damaged,
            "expiry": input.expiry.as_ref().map(format_date).unwrap_or_default(),
            "createdAt": format_timestamp(&created_at),
            "updatedAt": format_timestamp(&updated_at),
        }))
    }

    /// 存储文档 → 实体（无 ID 的文档丢弃）
    pub fn map_document(doc: &StoredDocument) -> Option<InventoryItem> {
        if doc.id.is_empty() {
            tracing::warn!(collection = "inventory", "丢弃无 ID 文档");
            return None;
        }
        let data = &doc.data;
        Some(InventoryItem {
            id: doc.id.clone(),
            sku: str_field(data, "sku"),
            category: str_field(data, "category"),
            quantity: int_field(data, "quantity"),
            perishable: bool_field(data, "perishable"),
            damaged: bool_field(data, "damaged"),
            expiry: date_field(data, "expiry"),
            created_at: timestamp_field(data, "createdAt"),
            updated_at: timestamp_field(data, "updatedAt"),
        })
    }

    /// 快照 → 实体列表（保持快照顺序）
    pub fn map_snapshot(docs: &[StoredDocument]) -> Vec<InventoryItem> {
        docs.iter().filter_map(Self::map_document).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteDocumentStore;
    use chrono::NaiveDate;

    fn repo() -> InventoryRepository {
        InventoryRepository::new(Arc::new(SqliteDocumentStore::in_memory().unwrap()))
    }

    #[test]
    fn test_create_and_find() {
        let repo = repo();
        let input = InventoryItemInput::new("A1", "Fruit", 10)
            .perishable(true)
            .expiry(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        let id = repo.create(&input).unwrap();

        let item = repo.find_by_id(&id).unwrap().unwrap();
        assert_eq!(item.sku, "A1");
        assert_eq!(item.quantity, 10);
        assert!(item.perishable);
        assert!(!item.damaged);
        assert_eq!(item.expiry, NaiveDate::from_ymd_opt(2024, 6, 1));
    }

    #[test]
    fn test_update_keeps_created_at() {
        let repo = repo();
        let id = repo.create(&InventoryItemInput::new("A1", "Fruit", 10)).unwrap();
        let before = repo.find_by_id(&id).unwrap().unwrap();

        repo.update(&id, &InventoryItemInput::new("A1", "Fresh Fruit", 12))
            .unwrap();
        let after = repo.find_by_id(&id).unwrap().unwrap();
        assert_eq!(after.category, "Fresh Fruit");
        assert_eq!(after.quantity, 12);
        assert_eq!(after.created_at, before.created_at);
    }

    #[test]
    fn test_find_by_sku_scans_all() {
        let repo = repo();
        repo.create(&InventoryItemInput::new("A1", "Fruit", 1)).unwrap();
        repo.create(&InventoryItemInput::new("B2", "Tools", 1)).unwrap();
        repo.create(&InventoryItemInput::new("A1", "Fruit", 2)).unwrap();

        assert_eq!(repo.find_by_sku("A1").unwrap().len(), 2);
        assert!(repo.find_by_sku("C3").unwrap().is_empty());
    }
}
