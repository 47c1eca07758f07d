// ==========================================
// DLVery 库存配送协同系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写、快照/恢复
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::UserRole;
use crate::store::{StoreError, StoreResult};
use chrono::{Duration, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> StoreResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager（与文档存储共用连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 配置（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> StoreResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> StoreResult<String> {
        let conn = self.get_conn()?;

        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖同名 global 配置，不删除快照中没有的键
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> StoreResult<usize> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    // ===== 角色配置 =====

    /// 配送员角色（默认 DLTeam）
    pub fn agent_role(&self) -> StoreResult<UserRole> {
        self.role_or_default(config_keys::AGENT_ROLE, UserRole::DLTeam)
    }

    /// 库存组角色（默认 InvTeam）
    pub fn inventory_role(&self) -> StoreResult<UserRole> {
        self.role_or_default(config_keys::INVENTORY_ROLE, UserRole::InvTeam)
    }

    fn role_or_default(&self, key: &str, default: UserRole) -> StoreResult<UserRole> {
        let value = self.get_config_or_default(key, default.as_str())?;
        Ok(UserRole::parse(value.trim()).unwrap_or_else(|| {
            tracing::warn!(config_key = key, raw_value = %value, "角色配置无效，使用默认值");
            default
        }))
    }

    // ===== 队列配置 =====

    /// "今天" 所用的时区偏移（分钟，范围 ±1440，默认 0 即 UTC）
    pub fn queue_utc_offset_minutes(&self) -> StoreResult<i64> {
        let value = self.get_config_or_default(config_keys::QUEUE_UTC_OFFSET_MINUTES, "0")?;
        Ok(value
            .trim()
            .parse::<i64>()
            .map(|m| m.clamp(-1440, 1440))
            .unwrap_or(0))
    }

    /// 按配置时区计算当前日期
    pub fn today(&self) -> StoreResult<NaiveDate> {
        let offset = self.queue_utc_offset_minutes()?;
        Ok((Utc::now() + Duration::minutes(offset)).date_naive())
    }

    // ===== 数据库配置 =====

    pub fn busy_timeout_ms(&self) -> StoreResult<u64> {
        let default = crate::db::DEFAULT_BUSY_TIMEOUT_MS.to_string();
        let value = self.get_config_or_default(config_keys::DB_BUSY_TIMEOUT_MS, &default)?;
        Ok(value
            .trim()
            .parse::<u64>()
            .unwrap_or(crate::db::DEFAULT_BUSY_TIMEOUT_MS))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 角色
    pub const AGENT_ROLE: &str = "agent.role";
    pub const INVENTORY_ROLE: &str = "inventory.role";

    // 队列
    pub const QUEUE_UTC_OFFSET_MINUTES: &str = "queue.utc_offset_minutes";

    // 数据库
    pub const DB_BUSY_TIMEOUT_MS: &str = "db.busy_timeout_ms";
}
