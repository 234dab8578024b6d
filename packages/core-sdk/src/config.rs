use std::path::PathBuf;

use crate::{
    client::DEFAULT_API_BASE, credentials::DEFAULT_NAMESPACE, db::DEFAULT_DB_FILE,
    telemetry::DEFAULT_LOG_DIR,
};

pub const ENV_API_BASE: &str = "LEETCODE_HELPER_API_BASE";
pub const ENV_DB: &str = "LEETCODE_HELPER_DB";
pub const ENV_NAMESPACE: &str = "LEETCODE_HELPER_NAMESPACE";
pub const ENV_LOG_DIR: &str = "LEETCODE_HELPER_LOG_DIR";

/**
 * \brief 客户端运行配置：后端地址、本地数据库路径、密钥命名空间与日志目录。
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base: String,
    pub db_path: PathBuf,
    pub namespace: String,
    pub log_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            namespace: DEFAULT_NAMESPACE.to_string(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl Settings {
    /**
     * \brief 从环境变量读取，未设置或为空时使用默认值。
     */
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            api_base: read(ENV_API_BASE).unwrap_or(defaults.api_base),
            db_path: read(ENV_DB).map(PathBuf::from).unwrap_or(defaults.db_path),
            namespace: read(ENV_NAMESPACE).unwrap_or(defaults.namespace),
            log_dir: read(ENV_LOG_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
        }
    }

    /**
     * \brief 用命令行参数覆盖。
     */
    pub fn with_overrides(mut self, api_base: Option<String>, db_path: Option<PathBuf>) -> Self {
        if let Some(base) = api_base {
            self.api_base = base;
        }
        if let Some(path) = db_path {
            self.db_path = path;
        }
        self
    }
}
