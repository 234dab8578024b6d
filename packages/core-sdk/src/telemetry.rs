use std::{fs::OpenOptions, io::Write, path::PathBuf};

use anyhow::Result;
use once_cell::sync::Lazy;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/** \brief 默认日志目录（当前目录下）。 */
pub const DEFAULT_LOG_DIR: &str = "logs";

const LOG_FILE: &str = "leetcode-helper.log";

static TELEMETRY_ENABLED: Lazy<std::sync::RwLock<bool>> =
    Lazy::new(|| std::sync::RwLock::new(false));

static LOG_DIR: Lazy<std::sync::RwLock<PathBuf>> =
    Lazy::new(|| std::sync::RwLock::new(PathBuf::from(DEFAULT_LOG_DIR)));

/**
 * \brief 更新遥测开关状态。
 */
pub fn set_enabled(enabled: bool) {
    if let Ok(mut guard) = TELEMETRY_ENABLED.write() {
        *guard = enabled;
    }
}

/**
 * \brief 查询当前遥测开关状态。
 */
pub fn is_enabled() -> bool {
    TELEMETRY_ENABLED.read().map(|g| *g).unwrap_or(false)
}

/**
 * \brief 修改日志目录（默认 ./logs），由 CLI 按配置在启动时设置。
 */
pub fn set_log_dir(dir: impl Into<PathBuf>) {
    if let Ok(mut guard) = LOG_DIR.write() {
        *guard = dir.into();
    }
}

/**
 * \brief 当前日志文件完整路径。
 */
pub fn log_path() -> PathBuf {
    LOG_DIR
        .read()
        .map(|d| d.clone())
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR))
        .join(LOG_FILE)
}

/**
 * \brief 记录常规事件。
 */
pub fn log_event(category: &str, message: &str) {
    if !is_enabled() {
        return;
    }
    if let Err(err) = write_line("INFO", category, message) {
        eprintln!("telemetry write failed: {}", err);
    }
}

/**
 * \brief 记录错误事件。
 */
pub fn log_error(category: &str, message: &str) {
    if !is_enabled() {
        return;
    }
    if let Err(err) = write_line("ERROR", category, message) {
        eprintln!("telemetry write failed: {}", err);
    }
}

fn format_line(
    timestamp: OffsetDateTime,
    level: &str,
    category: &str,
    message: &str,
) -> Result<String> {
    Ok(format!(
        "{} [{}] {} - {}",
        timestamp.format(&Rfc3339)?,
        level,
        category,
        message
    ))
}

fn write_line(level: &str, category: &str, message: &str) -> Result<()> {
    let path = log_path();
    if let Some(dir) = path.parent() {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let line = format_line(OffsetDateTime::now_utc(), level, category, message)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}
