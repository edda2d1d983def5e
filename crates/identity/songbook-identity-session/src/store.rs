//! Session store backends.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use url::Url;

use crate::{SessionError, SessionResult};
use songbook_auth_core::SESSION_TOKEN_NAME;

/// Process-wide store for the session credential.
///
/// All backends expose identical semantics: `set` overwrites unconditionally,
/// `remove` is idempotent, and `get` returns `None` rather than failing when
/// no credential is stored.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self) -> SessionResult<Option<String>>;
    async fn set(&self, token: &str) -> SessionResult<()>;
    async fn remove(&self) -> SessionResult<()>;
}

/// Generic string key/value persistence, used for credentials with their own
/// lifecycle next to the session token (the player token).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_value(&self, key: &str) -> SessionResult<Option<String>>;
    async fn set_value(&self, key: &str, value: &str) -> SessionResult<()>;
    async fn remove_value(&self, key: &str) -> SessionResult<()>;
}

/// Execution environment, resolved once at process startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Browser-hosted UI; the credential lives in the cookie jar.
    Web,
    /// Desktop shell; no cookie jar is shared with the server origin, the
    /// credential lives in a persisted store file.
    NativeShell,
}

/// Backend parameters for [`session_store_for`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Application origin the web cookie is scoped to.
    pub origin: Url,
    /// Path of the native shell's persisted store file.
    pub store_path: PathBuf,
}

/// Select the session store backend for the resolved environment. This is the
/// single branch point; everything downstream sees only the trait.
pub fn session_store_for(env: Environment, config: &StoreConfig) -> Arc<dyn SessionStore> {
    match env {
        Environment::Web => Arc::new(CookieSessionStore::new(config.origin.clone())),
        Environment::NativeShell => Arc::new(FileSessionStore::new(config.store_path.clone())),
    }
}

/// Web backend: the credential is a cookie on the application origin, so
/// same-site server requests carry it automatically.
pub struct CookieSessionStore {
    jar: Arc<Jar>,
    origin: Url,
}

impl CookieSessionStore {
    pub fn new(origin: Url) -> Self {
        Self::with_jar(Arc::new(Jar::default()), origin)
    }

    /// Share an existing jar, typically the one wired into the app's HTTP
    /// client so API calls see the cookie the server set on login.
    pub fn with_jar(jar: Arc<Jar>, origin: Url) -> Self {
        Self { jar, origin }
    }

    pub fn jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }
}

#[async_trait]
impl SessionStore for CookieSessionStore {
    async fn get(&self) -> SessionResult<Option<String>> {
        let Some(header) = self.jar.cookies(&self.origin) else {
            return Ok(None);
        };
        let header = header
            .to_str()
            .map_err(|e| SessionError::Store(e.to_string()))?;

        Ok(header
            .split("; ")
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, _)| *name == SESSION_TOKEN_NAME)
            .map(|(_, value)| value.to_string()))
    }

    async fn set(&self, token: &str) -> SessionResult<()> {
        self.jar.add_cookie_str(
            &format!("{SESSION_TOKEN_NAME}={token}; Path=/"),
            &self.origin,
        );
        Ok(())
    }

    async fn remove(&self) -> SessionResult<()> {
        self.jar.add_cookie_str(
            &format!("{SESSION_TOKEN_NAME}=; Path=/; Max-Age=0"),
            &self.origin,
        );
        Ok(())
    }
}

/// Native-shell backend: a JSON key/value file private to the native process.
pub struct FileSessionStore {
    path: PathBuf,
    // Single-writer discipline for read-modify-write cycles.
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> SessionResult<HashMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> SessionResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec(entries)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileSessionStore {
    async fn get_value(&self, key: &str) -> SessionResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set_value(&self, key: &str, value: &str) -> SessionResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries).await?;
        debug!(key, "persisted value in native store");
        Ok(())
    }

    async fn remove_value(&self, key: &str) -> SessionResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self) -> SessionResult<Option<String>> {
        self.get_value(SESSION_TOKEN_NAME).await
    }

    async fn set(&self, token: &str) -> SessionResult<()> {
        self.set_value(SESSION_TOKEN_NAME, token).await
    }

    async fn remove(&self) -> SessionResult<()> {
        self.remove_value(SESSION_TOKEN_NAME).await
    }
}

/// In-memory backend used as the injectable fake in tests.
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemorySessionStore {
    async fn get_value(&self, key: &str) -> SessionResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set_value(&self, key: &str, value: &str) -> SessionResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_value(&self, key: &str) -> SessionResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self) -> SessionResult<Option<String>> {
        self.get_value(SESSION_TOKEN_NAME).await
    }

    async fn set(&self, token: &str) -> SessionResult<()> {
        self.set_value(SESSION_TOKEN_NAME, token).await
    }

    async fn remove(&self) -> SessionResult<()> {
        self.remove_value(SESSION_TOKEN_NAME).await
    }
}
