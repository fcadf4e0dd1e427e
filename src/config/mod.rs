//! Configuration (layered: code > env > defaults).

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::auth::store::{FileTokenStore, TokenStore, TokenStoreConfig};
use crate::auth::AuthSession;
use crate::graphql::DataProvider;
use crate::transport::{AuthenticatedTransport, MissingTokenPolicy};

pub const DEFAULT_API_BASE_URL: &str = "https://api.crm.refine.dev";
pub const DEFAULT_API_URL: &str = "https://api.crm.refine.dev/graphql";
pub const DEFAULT_WS_URL: &str = "wss://api.crm.refine.dev/graphql";

pub const ENV_API_URL: &str = "CRM_API_URL";
pub const ENV_WS_URL: &str = "CRM_WS_URL";
pub const ENV_TOKEN_DIR: &str = "CRM_TOKEN_DIR";
pub const ENV_OMIT_MISSING_BEARER: &str = "CRM_OMIT_MISSING_BEARER";

/// Global default config (lazy-initialized from env).
static DEFAULT_CONFIG: OnceLock<CrmConfig> = OnceLock::new();

/// Endpoints, token location, and transport policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmConfig {
    pub api_url: String,
    pub ws_url: String,
    pub token_dir: PathBuf,
    pub missing_token: MissingTokenPolicy,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CrmConfig {
    /// Built-in defaults pointing at the public demo backend.
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            token_dir: TokenStoreConfig::default_dir(),
            missing_token: MissingTokenPolicy::default(),
        }
    }

    /// Load from environment variables (`CRM_API_URL`, `CRM_WS_URL`, ...).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::new();

        if let Some(url) = non_empty_env(ENV_API_URL) {
            config.api_url = url;
        }
        if let Some(url) = non_empty_env(ENV_WS_URL) {
            config.ws_url = url;
        }
        if let Some(dir) = non_empty_env(ENV_TOKEN_DIR) {
            config.token_dir = PathBuf::from(dir);
        }
        if non_empty_env(ENV_OMIT_MISSING_BEARER).is_some_and(|value| is_truthy(&value)) {
            config.missing_token = MissingTokenPolicy::Omit;
        }

        config
    }

    /// Get (or create) the global default config.
    pub fn global() -> &'static CrmConfig {
        DEFAULT_CONFIG.get_or_init(Self::from_env)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = url.into();
        self
    }

    pub fn with_token_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.token_dir = dir.into();
        self
    }

    pub fn with_missing_token_policy(mut self, policy: MissingTokenPolicy) -> Self {
        self.missing_token = policy;
        self
    }

    /// File-backed token store rooted at `token_dir`.
    pub fn token_store(&self) -> Arc<dyn TokenStore> {
        Arc::new(FileTokenStore::new(TokenStoreConfig::new(
            self.token_dir.clone(),
        )))
    }

    /// Wire transport, data provider, and session manager over `store`.
    pub fn session(&self, store: Arc<dyn TokenStore>) -> AuthSession {
        let transport =
            AuthenticatedTransport::new(store.clone()).with_missing_token_policy(self.missing_token);
        let data = DataProvider::new(self.api_url.clone(), transport);
        AuthSession::new(data, store)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
