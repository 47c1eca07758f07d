// ==========================================
// DLVery 库存配送协同系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把引擎/存储错误转换为调用方可读的错误
// 约束: 校验错误原样透出消息（如 "signature required"）
// ==========================================

use crate::engine::EngineError;
use crate::store::StoreError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    /// 校验失败；消息即调用方看到的原因
    #[error("{0}")]
    ValidationError(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("签收需要确认: delivery_id={0}")]
    ConfirmationRequired(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::ValidationError(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

// ==========================================
// 从 StoreError 转换
// ==========================================
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", collection, id))
            }
            StoreError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            StoreError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            StoreError::DatabaseTransactionError(msg) => ApiError::DatabaseTransactionError(msg),
            StoreError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            StoreError::SerializationError(msg) => {
                ApiError::InternalError(format!("文档序列化失败: {}", msg))
            }
            StoreError::InternalError(msg) => ApiError::InternalError(msg),
            StoreError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => ApiError::ValidationError(msg),
            EngineError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            EngineError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            EngineError::ConfirmationRequired { delivery_id } => {
                ApiError::ConfirmationRequired(delivery_id)
            }
            EngineError::Store(err) => err.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
