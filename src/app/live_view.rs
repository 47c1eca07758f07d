// ==========================================
// DLVery 库存配送协同系统 - 实时视图缓存
// ==========================================
// 单写者缓存: 只由订阅推送替换，命令处理从不直接改写
// 每次推送都是完整结果集，整体替换而不是合并
// ==========================================

use std::sync::Arc;

use crate::store::{StoredDocument, Subscription};

/// 快照 → 实体列表的映射函数
pub type SnapshotMapper<T> = fn(&[StoredDocument]) -> Vec<T>;

pub struct LiveView<T> {
    subscription: Subscription,
    mapper: SnapshotMapper<T>,
    items: Arc<Vec<T>>,
    version: u64,
}

impl<T> LiveView<T> {
    /// 以订阅的当前快照初始化
    pub fn new(mut subscription: Subscription, mapper: SnapshotMapper<T>) -> Self {
        let snapshot = subscription.take_latest();
        Self {
            items: Arc::new(mapper(&snapshot)),
            subscription,
            mapper,
            version: 0,
        }
    }

    /// 当前缓存（只读共享）
    pub fn current(&self) -> Arc<Vec<T>> {
        self.items.clone()
    }

    /// 已应用的推送次数
    pub fn version(&self) -> u64 {
        self.version
    }

    /// 若有新快照则整体替换缓存
    ///
    /// # 返回
    /// 是否发生替换
    pub fn sync(&mut self) -> bool {
        if !self.subscription.has_changed() {
            return false;
        }
        let snapshot = self.subscription.take_latest();
        self.replace(&snapshot);
        true
    }

    /// 等待下一次推送并替换缓存；存储已释放时返回 false
    pub async fn changed(&mut self) -> bool {
        match self.subscription.next().await {
            Some(snapshot) => {
                self.replace(&snapshot);
                true
            }
            None => false,
        }
    }

    fn replace(&mut self, snapshot: &[StoredDocument]) {
        self.items = Arc::new((self.mapper)(snapshot));
        self.version += 1;
        tracing::debug!(
            collection = %self.subscription.query().collection,
            size = self.items.len(),
            version = self.version,
            "实时视图已刷新"
        );
    }
}
