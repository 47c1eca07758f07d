// ==========================================
// DLVery 库存配送协同系统 - 用户数据仓储
// ==========================================
// 集合: users（核心只读）
// ==========================================

use std::sync::Arc;

use crate::domain::types::UserRole;
use crate::domain::user::User;
use crate::repository::normalize::str_field;
use crate::store::{
    Collection, DocumentQuery, DocumentStore, FieldFilter, StoreResult, StoredDocument,
};

pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn list_all(&self) -> StoreResult<Vec<User>> {
        let docs = self.store.get_all(&DocumentQuery::all(Collection::Users))?;
        Ok(docs.iter().filter_map(Self::map_document).collect())
    }

    /// 按角色查询（角色字符串精确匹配）
    pub fn list_by_role(&self, role: UserRole) -> StoreResult<Vec<User>> {
        let query =
            DocumentQuery::all(Collection::Users).filter(FieldFilter::eq("role", role.as_str()));
        let docs = self.store.get_all(&query)?;
        Ok(docs.iter().filter_map(Self::map_document).collect())
    }

    pub fn map_document(doc: &StoredDocument) -> Option<User> {
        if doc.id.is_empty() {
            tracing::warn!(collection = "users", "丢弃无 ID 文档");
            return None;
        }
        Some(User {
            id: doc.id.clone(),
            email: str_field(&doc.data, "email").trim().to_string(),
            role: str_field(&doc.data, "role"),
        })
    }
}
