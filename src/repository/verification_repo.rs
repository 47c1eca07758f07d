// ==========================================
// DLVery 库存配送协同系统 - 签收凭证数据仓储
// ==========================================
// 集合: verifications（只追加）
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::verification::Verification;
use crate::repository::normalize::{format_timestamp, str_field, timestamp_field};
use crate::store::{
    into_document, Collection, DocumentQuery, DocumentStore, FieldFilter, StoreResult,
    StoredDocument, WriteOp,
};

pub struct VerificationRepository {
    store: Arc<dyn DocumentStore>,
}

impl VerificationRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// 某配送单的签收凭证
    pub fn find_by_delivery(&self, delivery_id: &str) -> StoreResult<Vec<Verification>> {
        let query = DocumentQuery::all(Collection::Verifications)
            .filter(FieldFilter::eq("deliveryId", delivery_id));
        Ok(Self::map_snapshot(&self.store.get_all(&query)?))
    }

    pub fn list_all(&self) -> StoreResult<Vec<Verification>> {
        let docs = self
            .store
            .get_all(&DocumentQuery::all(Collection::Verifications))?;
        Ok(Self::map_snapshot(&docs))
    }

    /// 新建签收凭证（输入需已校验）
    pub fn create_op(
        delivery_id: &str,
        agent: &str,
        customer_name: &str,
        signature: &str,
        verified_at: DateTime<Utc>,
    ) -> WriteOp {
        WriteOp::Create {
            collection: Collection::Verifications,
            doc: into_document(json!({
                "deliveryId": delivery_id,
                "agent": agent,
                "customerName": customer_name,
                "signature": signature,
                "verifiedAt": format_timestamp(&verified_at),
            })),
        }
    }

    pub fn map_document(doc: &StoredDocument) -> Option<Verification> {
        if doc.id.is_empty() {
            tracing::warn!(collection = "verifications", "丢弃无 ID 文档");
            return None;
        }
        let data = &doc.data;
        Some(Verification {
            id: doc.id.clone(),
            delivery_id: str_field(data, "deliveryId"),
            agent: str_field(data, "agent"),
            customer_name: str_field(data, "customerName"),
            signature: str_field(data, "signature"),
            verified_at: timestamp_field(data, "verifiedAt"),
        })
    }

    pub fn map_snapshot(docs: &[StoredDocument]) -> Vec<Verification> {
        docs.iter().filter_map(Self::map_document).collect()
    }
}
