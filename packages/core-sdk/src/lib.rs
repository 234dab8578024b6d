pub mod client;
pub mod config;
pub mod credentials;
pub mod db;
pub mod models;
pub mod render;
pub mod storage;
pub mod telemetry;

/**
 * \brief SDK 预导入集合，方便外部引用常用类型。
 */
pub mod prelude {
    pub use crate::client::{ClientError, SolverClient};
    pub use crate::config::Settings;
    pub use crate::credentials::{CredentialError, CredentialStore};
    pub use crate::models::{Language, SolveRequest, Solution, UserLevel};
    pub use crate::storage::{KeyValueStore, MemoryStorage, SqliteStorage};
}
