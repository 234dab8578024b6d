use std::{collections::HashMap, path::Path, sync::RwLock};

use anyhow::{anyhow, Result};
use rusqlite::Connection;

use crate::db;

/**
 * \brief 持久化键值存储抽象，语义对齐浏览器 localStorage。
 * \details 单次调用即原子操作；删除不存在的键不视为错误。
 */
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    fn remove_item(&self, key: &str) -> Result<()>;

    /** \brief 以 prefix 开头的全部键，按字典序排列。 */
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get_item(key)?.is_some())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).keys_with_prefix(prefix)
    }

    fn contains(&self, key: &str) -> Result<bool> {
        (**self).contains(key)
    }
}

/**
 * \brief 进程内存储，进程退出即丢失。
 */
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let guard = self
            .items
            .read()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        Ok(guard.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self
            .items
            .write()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut guard = self
            .items
            .write()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        guard.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let guard = self
            .items
            .read()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        let mut keys: Vec<String> = guard
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/**
 * \brief 基于 SQLite `local_storage` 表的持久存储，重启后仍然保留。
 */
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /**
     * \brief 打开数据库文件并执行迁移。
     */
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = db::open_db(path)?;
        Self::from_connection(conn)
    }

    /**
     * \brief 包装已有连接（例如内存数据库），同样会执行迁移。
     */
    pub fn from_connection(conn: Connection) -> Result<Self> {
        db::migrate(&conn)?;
        Ok(Self { conn })
    }

    /** \brief 与 `app_config` 等其他表共享同一连接。 */
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValueStore for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        db::get_item(&self.conn, key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        db::set_item(&self.conn, key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        db::remove_item(&self.conn, key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        db::list_keys(&self.conn, prefix)
    }
}
