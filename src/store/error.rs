// ==========================================
// DLVery 库存配送协同系统 - 文档存储错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 存储层与仓储层共用同一错误类型
// ==========================================

use thiserror::Error;

/// 文档存储错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    // ===== 文档错误 =====
    #[error("文档未找到: {collection} with id={id}")]
    NotFound { collection: String, id: String },

    // ===== 数据库错误 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 文档格式错误 =====
    #[error("文档序列化失败: {0}")]
    SerializationError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// 构造 NotFound 错误
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// 是否为文档不存在
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => StoreError::DatabaseQueryError(msg),
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound {
                collection: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => StoreError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::SerializationError(err.to_string())
    }
}

/// Result 类型别名
pub type StoreResult<T> = Result<T, StoreError>;
