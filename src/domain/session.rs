// ==========================================
// DLVery 库存配送协同系统 - 配送员会话
// ==========================================
// 显式会话上下文：由调用方传入优先级引擎与状态机，不使用隐藏全局
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSession {
    pub agent_email: String,
}

impl AgentSession {
    /// 创建会话（邮箱去首尾空白；空邮箱返回 None）
    pub fn new(agent_email: &str) -> Option<Self> {
        let email = agent_email.trim();
        if email.is_empty() {
            None
        } else {
            Some(Self {
                agent_email: email.to_string(),
            })
        }
    }

    /// 配送单是否属于本会话配送员
    pub fn owns(&self, agent: &str) -> bool {
        agent == self.agent_email
    }
}
