// ==========================================
// DLVery 库存配送协同系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 校验错误 / 文档不存在 / 非法状态转换 / 存储错误
// 约束: 校验错误在任何写入之前返回，不产生持久化副作用
// ==========================================

use thiserror::Error;

use crate::store::StoreError;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 输入不合法（缺配送员、数量越界、缺签名/签收人）
    #[error("{0}")]
    Validation(String),

    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    /// 签收必须经过确认步骤（签收人 + 签名）
    #[error("签收需要确认: delivery_id={delivery_id}")]
    ConfirmationRequired { delivery_id: String },

    #[error(transparent)]
    Store(StoreError),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => EngineError::NotFound {
                entity: collection,
                id,
            },
            other => EngineError::Store(other),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
