use std::{
    collections::HashMap,
    future::Future,
    io::ErrorKind,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use crate::{Res, config};

/// Key of the persisted access credential.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Key of the single-use PKCE verifier, present only while a login is pending.
pub const VERIFIER_KEY: &str = "pkce_verifier";

/// Durable string storage for session state.
///
/// `set` and `clear` resolve only once the change is durable, so whatever
/// the caller does next can rely on a restart observing it.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Res<Option<String>>> + Send;
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Res<()>> + Send;
    fn clear(&self, key: &str) -> impl Future<Output = Res<()>> + Send;
}

/// Stores each key in its own file below a directory.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<data_local_dir>/tracklens/session`
    pub fn default_location() -> Self {
        Self::new(config::data_dir().join("session"))
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl SessionStore for FileSessionStore {
    async fn get(&self, key: &str) -> Res<Option<String>> {
        match async_fs::read_to_string(self.path(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Res<()> {
        async_fs::create_dir_all(&self.dir).await?;

        async_fs::write(self.path(key), value).await?;
        Ok(())
    }

    async fn clear(&self, key: &str) -> Res<()> {
        match async_fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Res<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| "session store lock poisoned".into())
    }
}

impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Res<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Res<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Res<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}
