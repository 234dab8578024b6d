use anyhow::Result;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::{path::Path, thread, time::Duration};

/**
 * \brief 默认数据库文件名（当前目录下）。
 */
pub const DEFAULT_DB_FILE: &str = "leetcode-helper.db";

/**
 * \brief 打开指定路径的数据库文件，必要时自动创建。
 */
pub fn open_db(path: impl AsRef<Path>) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(conn)
}

/**
 * \brief 运行数据库迁移，创建必要表结构。
 * \details `local_storage` 对应浏览器 localStorage 的键值语义；`app_config` 存放客户端自身开关。
 */
pub fn migrate(conn: &Connection) -> Result<()> {
    retry_on_locked(|| {
        conn.execute_batch(
            r#"
        PRAGMA journal_mode=WAL;
        CREATE TABLE IF NOT EXISTS local_storage (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS app_config (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
        )
    })?;
    Ok(())
}

/**
 * \brief 读取键值，不存在时返回 None。
 */
pub fn get_item(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM local_storage WHERE key=?1",
        params![key],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map_err(Into::into)
}

/**
 * \brief 写入键值，已存在则覆盖。
 */
pub fn set_item(conn: &Connection, key: &str, value: &str) -> Result<()> {
    retry_on_locked(|| {
        conn.execute(
            "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )
    })?;
    Ok(())
}

/**
 * \brief 删除键值；键不存在时静默成功。
 */
pub fn remove_item(conn: &Connection, key: &str) -> Result<()> {
    retry_on_locked(|| conn.execute("DELETE FROM local_storage WHERE key=?1", params![key]))?;
    Ok(())
}

/**
 * \brief 按前缀列出全部键，按字典序返回。
 * \details 用 substr 精确比较前缀，避免 LIKE 把 `_`/`%` 当作通配符。
 */
pub fn list_keys(conn: &Connection, prefix: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT key FROM local_storage WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key ASC",
    )?;
    let rows = stmt
        .query_map(params![prefix], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn set_bool_config(conn: &Connection, key: &str, value: bool) -> Result<()> {
    retry_on_locked(|| {
        conn.execute(
            "INSERT INTO app_config (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, if value { "1" } else { "0" }],
        )
    })?;
    Ok(())
}

fn get_bool_config(conn: &Connection, key: &str, default: bool) -> Result<bool> {
    let val = conn
        .query_row(
            "SELECT value FROM app_config WHERE key=?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(val.map(|s| s == "1").unwrap_or(default))
}

/**
 * \brief 读取遥测开关。
 */
pub fn get_telemetry_enabled(conn: &Connection) -> Result<bool> {
    get_bool_config(conn, "telemetry_enabled", false)
}

/**
 * \brief 更新遥测开关。
 */
pub fn set_telemetry_enabled(conn: &Connection, enabled: bool) -> Result<()> {
    set_bool_config(conn, "telemetry_enabled", enabled)
}

/**
 * \brief 针对 SQLite 锁冲突的重试助手。
 * \details 捕获 `database is locked`/`database table is locked` 等错误并进行线性退避，最大尝试 6 次。
 */
fn retry_on_locked<T, F>(mut action: F) -> Result<T>
where
    F: FnMut() -> rusqlite::Result<T>,
{
    const MAX_RETRIES: usize = 5;
    for attempt in 0..=MAX_RETRIES {
        match action() {
            Ok(value) => return Ok(value),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if matches!(
                    err.code,
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
                ) && attempt < MAX_RETRIES =>
            {
                let backoff = Duration::from_millis(200 * (attempt as u64 + 1));
                thread::sleep(backoff);
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
    unreachable!("retry_on_locked should have returned within the loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        migrate(&conn).expect("migrate");
        conn
    }

    #[test]
    fn test_item_set_get_overwrite() {
        let conn = mem_conn();
        assert_eq!(get_item(&conn, "k").expect("get empty"), None);

        set_item(&conn, "k", "v1").expect("set 1");
        set_item(&conn, "k", "v2").expect("set 2");
        assert_eq!(get_item(&conn, "k").expect("get").as_deref(), Some("v2"));
    }

    #[test]
    fn test_remove_item_is_idempotent() {
        let conn = mem_conn();
        remove_item(&conn, "missing").expect("remove missing");

        set_item(&conn, "k", "v").expect("set");
        remove_item(&conn, "k").expect("remove");
        remove_item(&conn, "k").expect("remove again");
        assert_eq!(get_item(&conn, "k").expect("get"), None);
    }

    #[test]
    fn test_list_keys_filters_prefix() {
        let conn = mem_conn();
        set_item(&conn, "leetcode-helper-openai-api-key", "a").expect("set a");
        set_item(&conn, "leetcode-helper-groq-api-key", "b").expect("set b");
        set_item(&conn, "other-key", "c").expect("set c");
        set_item(&conn, "leetcodeXhelper-x", "d").expect("set d");

        let keys = list_keys(&conn, "leetcode-helper-").expect("list");
        assert_eq!(
            keys,
            vec![
                "leetcode-helper-groq-api-key".to_string(),
                "leetcode-helper-openai-api-key".to_string()
            ]
        );
    }

    #[test]
    fn test_list_keys_treats_wildcards_literally() {
        let conn = mem_conn();
        set_item(&conn, "team_a-openai-api-key", "a").expect("set a");
        set_item(&conn, "teamXa-openai-api-key", "b").expect("set b");

        let keys = list_keys(&conn, "team_a-").expect("list");
        assert_eq!(keys, vec!["team_a-openai-api-key".to_string()]);
    }

    #[test]
    fn test_telemetry_flag_defaults_off_and_persists() {
        let conn = mem_conn();
        assert!(!get_telemetry_enabled(&conn).expect("default"));
        set_telemetry_enabled(&conn, true).expect("enable");
        assert!(get_telemetry_enabled(&conn).expect("read back"));
        set_telemetry_enabled(&conn, false).expect("disable");
        assert!(!get_telemetry_enabled(&conn).expect("read back 2"));
    }

    #[test]
    fn test_migrate_is_repeatable() {
        let conn = mem_conn();
        set_item(&conn, "k", "v").expect("set");
        migrate(&conn).expect("migrate again");
        assert_eq!(get_item(&conn, "k").expect("get").as_deref(), Some("v"));
    }
}
