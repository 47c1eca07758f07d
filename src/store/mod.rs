// ==========================================
// DLVery 库存配送协同系统 - 文档存储层
// ==========================================
// 职责: 外部协作者（集合存储）的抽象契约与 SQLite 实现
// 契约: create / update(部分) / delete / get / get_all / 批量原子写 / 快照订阅
// 红线: 存储层不做业务逻辑，不约束文档结构
// ==========================================

pub mod document;
pub mod error;
pub mod sqlite_store;
pub mod subscription;

pub use document::{
    into_document, Collection, Document, DocumentQuery, FieldFilter, OrderBy, StoredDocument, WriteOp,
};
pub use error::{StoreError, StoreResult};
pub use sqlite_store::SqliteDocumentStore;
pub use subscription::{Snapshot, Subscription, SubscriptionHub};

// ==========================================
// DocumentStore - 集合存储契约
// ==========================================
/// 集合存储契约
///
/// 所有跨文档一致性依赖 `apply_batch` 的原子性：批次内任一写失败，整批不生效。
/// 客户端不加锁；同字段并发写入为后写者胜。
pub trait DocumentStore: Send + Sync {
    /// 读取单个文档
    fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<StoredDocument>>;

    /// 按查询读取全部匹配文档（不分页）
    fn get_all(&self, query: &DocumentQuery) -> StoreResult<Vec<StoredDocument>>;

    /// 原子提交一批写操作
    ///
    /// # 返回
    /// 与 `ops` 一一对应；Create 位置为新文档 ID，其余为 None
    fn apply_batch(&self, ops: Vec<WriteOp>) -> StoreResult<Vec<Option<String>>>;

    /// 订阅查询结果；每次相关提交后推送完整结果集
    fn subscribe(&self, query: DocumentQuery) -> StoreResult<Subscription>;

    /// 新建文档，返回 ID
    fn create(&self, collection: Collection, doc: Document) -> StoreResult<String> {
        let ids = self.apply_batch(vec![WriteOp::Create { collection, doc }])?;
        ids.into_iter()
            .next()
            .flatten()
            .ok_or_else(|| StoreError::InternalError("create 未返回文档 ID".to_string()))
    }

    /// 部分更新（顶层字段浅合并）
    fn update(&self, collection: Collection, id: &str, patch: Document) -> StoreResult<()> {
        self.apply_batch(vec![WriteOp::Update {
            collection,
            id: id.to_string(),
            patch,
        }])?;
        Ok(())
    }

    /// 删除文档
    fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        self.apply_batch(vec![WriteOp::Delete {
            collection,
            id: id.to_string(),
        }])?;
        Ok(())
    }
}
