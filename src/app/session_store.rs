// ==========================================
// DLVery 库存配送协同系统 - 配送员会话持久化
// ==========================================
// 进程边界上的显式 load / save / clear 钩子
// 存储: 用户数据目录下的 JSON 文件
// ==========================================

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::domain::session::AgentSession;

/// 会话文件名
pub const SESSION_FILE_NAME: &str = "session.json";

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// 指定会话文件路径
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 默认位置: {data_dir}/dlvery/session.json；无法获取数据目录时使用当前目录
    pub fn default_location() -> Self {
        let dir = dirs::data_dir()
            .map(|d| d.join("dlvery"))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir.join(SESSION_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取会话；文件不存在返回 None，内容损坏时记录告警并返回 None
    pub fn load(&self) -> anyhow::Result<Option<AgentSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("读取会话文件失败: {}", self.path.display()))?;

        match serde_json::from_str::<AgentSession>(&raw) {
            Ok(session) => Ok(AgentSession::new(&session.agent_email)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "会话文件损坏，按未登录处理");
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &AgentSession) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("创建会话目录失败: {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("写入会话文件失败: {}", self.path.display()))?;
        tracing::debug!(agent = %session.agent_email, "会话已保存");
        Ok(())
    }

    /// 清除会话（文件不存在也视为成功）
    pub fn clear(&self) -> anyhow::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("删除会话文件失败: {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join(SESSION_FILE_NAME));
        assert_eq!(store.load().unwrap(), None);

        let session = AgentSession::new("agent@x.com").unwrap();
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SESSION_FILE_NAME);
        fs::write(&path, "not json").unwrap();
        assert_eq!(SessionStore::new(path).load().unwrap(), None);
    }
}
