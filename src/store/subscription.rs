// ==========================================
// DLVery 库存配送协同系统 - 快照订阅
// ==========================================
// 职责: 每次提交后向订阅者推送“完整当前结果集”（非增量）
// 实现: tokio::sync::watch，接收端永远只看到最新快照
// ==========================================

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::store::document::{Collection, DocumentQuery, StoredDocument};
use crate::store::error::{StoreError, StoreResult};

/// 完整快照
pub type Snapshot = Arc<Vec<StoredDocument>>;

// ==========================================
// Subscription - 订阅句柄
// ==========================================
/// 订阅句柄
///
/// 丢弃句柄即取消订阅（发布端在下次推送时清理已关闭的通道）。
#[derive(Debug)]
pub struct Subscription {
    query: DocumentQuery,
    rx: watch::Receiver<Snapshot>,
}

impl Subscription {
    pub fn query(&self) -> &DocumentQuery {
        &self.query
    }

    /// 当前快照（不标记为已读）
    pub fn current(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    /// 自上次读取以来是否有新快照
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// 读取最新快照并标记为已读
    pub fn take_latest(&mut self) -> Snapshot {
        self.rx.borrow_and_update().clone()
    }

    /// 等待下一次快照推送
    ///
    /// 存储被释放后返回 None。
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

struct Subscriber {
    query: DocumentQuery,
    tx: watch::Sender<Snapshot>,
}

// ==========================================
// SubscriptionHub - 订阅中心
// ==========================================
#[derive(Default)]
pub struct SubscriptionHub {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl SubscriptionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册订阅，初始值为当前结果集
    pub fn register(&self, query: DocumentQuery, initial: Vec<StoredDocument>) -> StoreResult<Subscription> {
        let (tx, rx) = watch::channel(Arc::new(initial));
        let mut subscribers = self
            .subscribers
            .lock()
            .map_err(|e| StoreError::LockError(e.to_string()))?;
        subscribers.push(Subscriber {
            query: query.clone(),
            tx,
        });
        Ok(Subscription { query, rx })
    }

    /// 当前有效订阅数
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .map(|subs| subs.iter().filter(|s| !s.tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// 向涉及指定集合的订阅者推送完整快照
    ///
    /// `load` 负责按订阅查询重新读取结果集。单个订阅读取失败只记录事件，不影响其他订阅。
    pub fn publish<F>(&self, touched: &[Collection], load: F) -> StoreResult<()>
    where
        F: Fn(&DocumentQuery) -> StoreResult<Vec<StoredDocument>>,
    {
        let mut subscribers = self
            .subscribers
            .lock()
            .map_err(|e| StoreError::LockError(e.to_string()))?;

        subscribers.retain(|s| !s.tx.is_closed());

        for sub in subscribers.iter() {
            if !touched.contains(&sub.query.collection) {
                continue;
            }
            match load(&sub.query) {
                Ok(docs) => {
                    sub.tx.send_replace(Arc::new(docs));
                }
                Err(e) => {
                    tracing::error!(
                        collection = %sub.query.collection,
                        error = %e,
                        "快照推送失败，订阅者保留旧快照"
                    );
                }
            }
        }
        Ok(())
    }
}
