// ==========================================
// DLVery 库存配送协同系统 - SQLite 文档存储
// ==========================================
// 存储: documents 表 (collection, doc_id, body JSON, seq)
// 原子性: apply_batch 在单个事务内提交
// 推送: 提交成功后按订阅查询重读并推送完整快照
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use uuid::Uuid;

use crate::db::{open_in_memory, open_sqlite_connection};
use crate::store::document::{Collection, Document, DocumentQuery, StoredDocument, WriteOp};
use crate::store::error::{StoreError, StoreResult};
use crate::store::subscription::{Subscription, SubscriptionHub};
use crate::store::DocumentStore;

// ==========================================
// SqliteDocumentStore
// ==========================================
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
    hub: SubscriptionHub,
}

impl SqliteDocumentStore {
    /// 打开数据库文件
    pub fn new(db_path: &str) -> StoreResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| StoreError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 内存库（测试用）
    pub fn in_memory() -> StoreResult<Self> {
        let conn = open_in_memory().map_err(|e| StoreError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建（连接需已完成建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            hub: SubscriptionHub::new(),
        }
    }

    /// 共享连接（供操作日志、配置等表复用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    /// 当前有效订阅数
    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    fn get_conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::LockError(e.to_string()))
    }

    fn load_collection(conn: &Connection, collection: Collection) -> StoreResult<Vec<StoredDocument>> {
        let mut stmt = conn.prepare(
            "SELECT doc_id, body FROM documents WHERE collection = ?1 ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![collection.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, body) = row?;
            docs.push(StoredDocument::new(id, parse_body(&body)?));
        }
        Ok(docs)
    }

    fn query_with(conn: &Connection, query: &DocumentQuery) -> StoreResult<Vec<StoredDocument>> {
        let docs = Self::load_collection(conn, query.collection)?;
        Ok(query.apply(docs))
    }

    fn next_seq(tx: &Transaction<'_>) -> StoreResult<i64> {
        let seq: i64 = tx.query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM documents", [], |row| {
            row.get(0)
        })?;
        Ok(seq)
    }

    fn apply_op(tx: &Transaction<'_>, op: WriteOp) -> StoreResult<Option<String>> {
        match op {
            WriteOp::Create { collection, doc } => {
                let id = Uuid::new_v4().to_string();
                let seq = Self::next_seq(tx)?;
                tx.execute(
                    "INSERT INTO documents (collection, doc_id, body, seq) VALUES (?1, ?2, ?3, ?4)",
                    params![collection.as_str(), id, serde_json::to_string(&doc)?, seq],
                )?;
                Ok(Some(id))
            }
            WriteOp::Update { collection, id, patch } => {
                let body: Option<String> = tx
                    .query_row(
                        "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2",
                        params![collection.as_str(), id],
                        |row| row.get(0),
                    )
                    .optional()?;
                let mut current = match body {
                    Some(b) => parse_body(&b)?,
                    None => return Err(StoreError::not_found(collection.as_str(), id)),
                };
                for (k, v) in patch {
                    current.insert(k, v);
                }
                tx.execute(
                    "UPDATE documents SET body = ?3 WHERE collection = ?1 AND doc_id = ?2",
                    params![collection.as_str(), id, serde_json::to_string(&current)?],
                )?;
                Ok(None)
            }
            WriteOp::Delete { collection, id } => {
                let rows = tx.execute(
                    "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
                    params![collection.as_str(), id],
                )?;
                if rows == 0 {
                    return Err(StoreError::not_found(collection.as_str(), id));
                }
                Ok(None)
            }
        }
    }
}

fn parse_body(body: &str) -> StoreResult<Document> {
    match serde_json::from_str::<serde_json::Value>(body)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(StoreError::SerializationError(format!(
            "文档正文不是对象: {}",
            other
        ))),
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<StoredDocument>> {
        let conn = self.get_conn()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2",
                params![collection.as_str(), id],
                |row| row.get(0),
            )
            .optional()?;
        match body {
            Some(b) => Ok(Some(StoredDocument::new(id, parse_body(&b)?))),
            None => Ok(None),
        }
    }

    fn get_all(&self, query: &DocumentQuery) -> StoreResult<Vec<StoredDocument>> {
        let conn = self.get_conn()?;
        Self::query_with(&conn, query)
    }

    fn apply_batch(&self, ops: Vec<WriteOp>) -> StoreResult<Vec<Option<String>>> {
        if ops.is_empty() {
            return Ok(Vec::new());
        }

        let mut touched: Vec<Collection> = Vec::new();
        for op in &ops {
            let c = op.collection();
            if !touched.contains(&c) {
                touched.push(c);
            }
        }

        let op_count = ops.len();
        let ids = {
            let mut conn = self.get_conn()?;
            let tx = conn
                .transaction()
                .map_err(|e| StoreError::DatabaseTransactionError(e.to_string()))?;

            let mut ids = Vec::with_capacity(op_count);
            for op in ops {
                // 任一失败: tx 被丢弃即回滚
                ids.push(Self::apply_op(&tx, op)?);
            }
            tx.commit()
                .map_err(|e| StoreError::DatabaseTransactionError(e.to_string()))?;
            ids
        };

        tracing::debug!(ops = op_count, collections = ?touched, "批量写入已提交");

        // 已提交的写入不因推送失败而报错
        let conn = self.conn.clone();
        if let Err(e) = self.hub.publish(&touched, |query| {
            let guard = conn
                .lock()
                .map_err(|e| StoreError::LockError(e.to_string()))?;
            Self::query_with(&guard, query)
        }) {
            tracing::error!(error = %e, "快照推送失败");
        }

        Ok(ids)
    }

    fn subscribe(&self, query: DocumentQuery) -> StoreResult<Subscription> {
        let initial = {
            let conn = self.get_conn()?;
            Self::query_with(&conn, &query)?
        };
        self.hub.register(query, initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::document::{FieldFilter, OrderBy};
    use serde_json::{json, Value};

    fn obj(v: Value) -> Document {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_create_update_delete() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let id = store
            .create(Collection::Inventory, obj(json!({"sku": "A1", "quantity": 3})))
            .unwrap();

        store
            .update(Collection::Inventory, &id, obj(json!({"quantity": 5})))
            .unwrap();
        let doc = store.get(Collection::Inventory, &id).unwrap().unwrap();
        assert_eq!(doc.field("quantity"), Some(&json!(5)));
        assert_eq!(doc.field("sku"), Some(&json!("A1")));

        store.delete(Collection::Inventory, &id).unwrap();
        assert!(store.get(Collection::Inventory, &id).unwrap().is_none());
    }

    #[test]
    fn test_update_missing_document_is_not_found() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let err = store
            .update(Collection::Deliveries, "missing", obj(json!({"status": "in_transit"})))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_batch_rolls_back_on_failure() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let result = store.apply_batch(vec![
            WriteOp::Create {
                collection: Collection::Deliveries,
                doc: obj(json!({"sku": "A1"})),
            },
            WriteOp::Delete {
                collection: Collection::Inventory,
                id: "missing".to_string(),
            },
        ]);
        assert!(result.is_err());

        let deliveries = store
            .get_all(&DocumentQuery::all(Collection::Deliveries))
            .unwrap();
        assert!(deliveries.is_empty(), "失败批次不得留下部分写入");
    }

    #[test]
    fn test_subscription_receives_full_snapshot() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let mut sub = store
            .subscribe(
                DocumentQuery::all(Collection::Deliveries)
                    .filter(FieldFilter::eq("agent", "a@x.com"))
                    .order_by(OrderBy::desc("createdAt")),
            )
            .unwrap();
        assert!(sub.current().is_empty());

        store
            .create(
                Collection::Deliveries,
                obj(json!({"agent": "a@x.com", "createdAt": "2024-05-01T00:00:00Z"})),
            )
            .unwrap();
        store
            .create(
                Collection::Deliveries,
                obj(json!({"agent": "b@x.com", "createdAt": "2024-05-02T00:00:00Z"})),
            )
            .unwrap();
        store
            .create(
                Collection::Deliveries,
                obj(json!({"agent": "a@x.com", "createdAt": "2024-05-03T00:00:00Z"})),
            )
            .unwrap();

        assert!(sub.has_changed());
        let snapshot = sub.take_latest();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot[0].field("createdAt"),
            Some(&json!("2024-05-03T00:00:00Z"))
        );
        assert!(!sub.has_changed());
    }

    #[test]
    fn test_failed_batch_does_not_publish() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let sub = store.subscribe(DocumentQuery::all(Collection::Inventory)).unwrap();
        let _ = store.delete(Collection::Inventory, "missing");
        assert!(!sub.has_changed());
    }
}
