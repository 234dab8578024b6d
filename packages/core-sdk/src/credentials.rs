use thiserror::Error;

use crate::{storage::KeyValueStore, telemetry};

/** \brief 存储键默认命名空间。 */
pub const DEFAULT_NAMESPACE: &str = "leetcode-helper";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("provider must not be empty")]
    EmptyProvider,
    #[error("api key must not be empty")]
    EmptySecret,
    #[error("credential storage failed: {0}")]
    Storage(#[from] anyhow::Error),
}

/**
 * \brief Provider API Key 的本地存储，每个 Provider 一条记录。
 * \details 键格式为 `<namespace>-<provider>-api-key`；密钥内容不会写入日志。
 */
pub struct CredentialStore<S> {
    storage: S,
    namespace: String,
}

impl<S: KeyValueStore> CredentialStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_namespace(storage, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(storage: S, namespace: impl Into<String>) -> Self {
        Self {
            storage,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /**
     * \brief 计算 Provider 对应的存储键。
     */
    pub fn storage_key(&self, provider: &str) -> String {
        format!("{}-{}-api-key", self.namespace, provider)
    }

    /**
     * \brief 保存（覆盖）密钥；任一参数为空时不做任何修改。
     */
    pub fn save(&self, provider: &str, secret: &str) -> Result<(), CredentialError> {
        if provider.is_empty() {
            return Err(CredentialError::EmptyProvider);
        }
        if secret.is_empty() {
            return Err(CredentialError::EmptySecret);
        }
        self.storage
            .set_item(&self.storage_key(provider), secret)?;
        telemetry::log_event("credentials", &format!("save provider={}", provider));
        Ok(())
    }

    /**
     * \brief 读取密钥；不存在、Provider 为空或存储异常时返回 None。
     */
    pub fn get(&self, provider: &str) -> Option<String> {
        if provider.is_empty() {
            return None;
        }
        match self.storage.get_item(&self.storage_key(provider)) {
            Ok(value) => value,
            Err(err) => {
                telemetry::log_error(
                    "credentials",
                    &format!("read provider={} failed: {}", provider, err),
                );
                None
            }
        }
    }

    /**
     * \brief 删除密钥，记录不存在时同样成功。
     */
    pub fn remove(&self, provider: &str) -> Result<(), CredentialError> {
        if provider.is_empty() {
            return Err(CredentialError::EmptyProvider);
        }
        self.storage.remove_item(&self.storage_key(provider))?;
        telemetry::log_event("credentials", &format!("remove provider={}", provider));
        Ok(())
    }

    /**
     * \brief 列出当前命名空间下已保存密钥的 Provider，按字典序排列。
     */
    pub fn saved_providers(&self) -> Result<Vec<String>, CredentialError> {
        let prefix = format!("{}-", self.namespace);
        let keys = self.storage.keys_with_prefix(&prefix)?;
        Ok(keys
            .iter()
            .filter_map(|key| key.strip_prefix(&prefix)?.strip_suffix("-api-key"))
            .filter(|provider| !provider.is_empty())
            .map(str::to_string)
            .collect())
    }

    /**
     * \brief 是否存在非空密钥。
     */
    pub fn has(&self, provider: &str) -> bool {
        self.get(provider).is_some_and(|s| !s.is_empty())
    }
}
