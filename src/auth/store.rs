use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// Name of the single persisted key holding the bearer token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

const SESSION_FILE_NAME: &str = "session.toml";
const SESSION_FILE_VERSION: u32 = 1;

/// Storage abstraction for the current access token.
///
/// At most one token is authoritative at a time. Callers read it fresh before
/// every request so a logout is never followed by a stale snapshot.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Result<Option<String>, AuthError>;
    fn set(&self, token: &str) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// Configuration for file-backed token storage.
#[derive(Debug, Clone)]
pub struct TokenStoreConfig {
    pub base_dir: PathBuf,
}

impl TokenStoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_dir() -> PathBuf {
        default_crm_dir()
    }
}

/// File-backed token store persisting `access_token` in a TOML file.
///
/// # Example
/// ```no_run
/// use crm_client::auth::{FileTokenStore, TokenStore};
///
/// let store = FileTokenStore::new_default();
/// store.set("tok123")?;
/// assert_eq!(store.get()?.as_deref(), Some("tok123"));
/// # Ok::<(), crm_client::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    base_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(config: TokenStoreConfig) -> Self {
        Self {
            base_dir: config.base_dir,
        }
    }

    pub fn new_default() -> Self {
        Self {
            base_dir: default_crm_dir(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.base_dir.join(SESSION_FILE_NAME)
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<String>, AuthError> {
        let raw = match fs::read_to_string(self.path()) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: SessionFile = toml::from_str(&raw)?;
        Ok(file.access_token)
    }

    fn set(&self, token: &str) -> Result<(), AuthError> {
        let path = self.path();
        Self::ensure_parent(&path)?;
        let file = SessionFile {
            version: SESSION_FILE_VERSION,
            access_token: Some(token.to_string()),
            saved_at: Utc::now(),
        };
        fs::write(&path, toml::to_string(&file)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

/// In-memory token store for tests and embedders that manage persistence
/// themselves.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>, AuthError> {
        self.token
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| AuthError::Poisoned)
    }

    fn set(&self, token: &str) -> Result<(), AuthError> {
        *self.token.write().map_err(|_| AuthError::Poisoned)? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.token.write().map_err(|_| AuthError::Poisoned)? = None;
        Ok(())
    }
}

/// Read the token, treating storage failures as "no token".
pub(crate) fn current_token(store: &dyn TokenStore) -> Option<String> {
    match store.get() {
        Ok(token) => token,
        Err(err) => {
            tracing::warn!(error = %err, "failed to read access token; continuing without one");
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    access_token: Option<String>,
    saved_at: DateTime<Utc>,
}

fn default_crm_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".crm-client"))
        .unwrap_or_else(|| PathBuf::from(".crm-client"))
}
