use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{MockEmail, MockUser};

pub const CART_KEY: &str = "cart";
pub const GUEST_SESSION_KEY: &str = "guest_session_id";
pub const MOCK_USERS_KEY: &str = "mock_users";
pub const MOCK_EMAILS_KEY: &str = "mock_emails";
pub const CURRENT_USER_KEY: &str = "current_user";

#[derive(Debug, Error)]
pub enum LocalStorageError {
    #[error("Local storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Local storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Device-local key/value store holding JSON values.
///
/// Backed by a single JSON object file when a path is given, otherwise kept
/// in memory for the life of the process.
pub struct LocalStorage {
    path: Option<PathBuf>,
    entries: Mutex<Map<String, Value>>,
}

impl LocalStorage {
    pub fn in_memory() -> Self {
        Self { path: None, entries: Mutex::new(Map::new()) }
    }

    /// Opens the file at `path`, starting empty when it does not exist yet.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LocalStorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Map::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(keys = entries.len(), "Local storage opened");
        Ok(Self { path: Some(path), entries: Mutex::new(entries) })
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, LocalStorageError> {
        match self.entries.lock().get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), LocalStorageError> {
        let value = serde_json::to_value(value)?;
        self.entries.lock().insert(key.to_string(), value);
        self.flush().await
    }

    pub async fn remove(&self, key: &str) -> Result<(), LocalStorageError> {
        let removed = self.entries.lock().remove(key).is_some();
        if removed {
            self.flush().await?;
        }
        Ok(())
    }

    /// The persisted guest session id, created on first use as `guest_<uuid>`.
    pub async fn guest_session_id(&self) -> Result<String, LocalStorageError> {
        if let Some(id) = self.get::<String>(GUEST_SESSION_KEY)? {
            return Ok(id);
        }
        let id = format!("guest_{}", Uuid::new_v4());
        self.set(GUEST_SESSION_KEY, &id).await?;
        Ok(id)
    }

    pub fn mock_users(&self) -> Result<Vec<MockUser>, LocalStorageError> {
        Ok(self.get(MOCK_USERS_KEY)?.unwrap_or_default())
    }

    /// Inserts `user` or replaces the record with the same id.
    pub async fn save_mock_user(&self, user: &MockUser) -> Result<(), LocalStorageError> {
        let mut users = self.mock_users()?;
        match users.iter_mut().find(|existing| existing.id == user.id) {
            Some(existing) => *existing = user.clone(),
            None => users.push(user.clone()),
        }
        self.set(MOCK_USERS_KEY, &users).await
    }

    pub fn mock_emails(&self) -> Result<Vec<MockEmail>, LocalStorageError> {
        Ok(self.get(MOCK_EMAILS_KEY)?.unwrap_or_default())
    }

    pub async fn record_mock_email(&self, email: &MockEmail) -> Result<(), LocalStorageError> {
        let mut emails = self.mock_emails()?;
        emails.push(email.clone());
        self.set(MOCK_EMAILS_KEY, &emails).await
    }

    pub fn current_user(&self) -> Result<Option<MockUser>, LocalStorageError> {
        self.get(CURRENT_USER_KEY)
    }

    /// `None` signs the device out.
    pub async fn set_current_user(&self, user: Option<&MockUser>) -> Result<(), LocalStorageError> {
        match user {
            Some(user) => self.set(CURRENT_USER_KEY, user).await,
            None => self.remove(CURRENT_USER_KEY).await,
        }
    }

    async fn flush(&self) -> Result<(), LocalStorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(&*self.entries.lock())?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockEmailKind;

    #[tokio::test]
    async fn in_memory_round_trip() {
        let storage = LocalStorage::in_memory();
        assert_eq!(storage.get::<Vec<u32>>(CART_KEY).unwrap(), None);
        storage.set(CART_KEY, &vec![1u32, 2]).await.unwrap();
        assert_eq!(storage.get::<Vec<u32>>(CART_KEY).unwrap(), Some(vec![1, 2]));
        storage.remove(CART_KEY).await.unwrap();
        assert_eq!(storage.get::<Vec<u32>>(CART_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn file_backed_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local_storage.json");

        let storage = LocalStorage::open(&path).await.unwrap();
        let guest = storage.guest_session_id().await.unwrap();
        assert!(guest.starts_with("guest_"));
        storage.set(CART_KEY, &vec!["line"]).await.unwrap();

        let reopened = LocalStorage::open(&path).await.unwrap();
        assert_eq!(reopened.guest_session_id().await.unwrap(), guest);
        assert_eq!(reopened.get::<Vec<String>>(CART_KEY).unwrap(), Some(vec!["line".to_string()]));
    }

    #[tokio::test]
    async fn account_keys_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");

        let storage = LocalStorage::open(&path).await.unwrap();
        assert!(storage.mock_users().unwrap().is_empty());
        assert!(storage.mock_emails().unwrap().is_empty());
        assert_eq!(storage.current_user().unwrap(), None);

        let ada = MockUser::new("u1").with_email("ada@example.com");
        storage.save_mock_user(&ada).await.unwrap();
        let confirmed = MockUser { email_confirmed: true, ..ada.clone() };
        storage.save_mock_user(&confirmed).await.unwrap();
        storage.save_mock_user(&MockUser::new("u2")).await.unwrap();
        let activation = MockEmail::new("ada@example.com", MockEmailKind::Activation);
        storage.record_mock_email(&activation).await.unwrap();
        storage.set_current_user(Some(&confirmed)).await.unwrap();

        let reopened = LocalStorage::open(&path).await.unwrap();
        let users = reopened.mock_users().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0], confirmed);
        assert_eq!(reopened.mock_emails().unwrap(), vec![activation]);
        assert_eq!(reopened.current_user().unwrap(), Some(confirmed));

        reopened.set_current_user(None).await.unwrap();
        let raw: Value = serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
        assert!(raw.get(CURRENT_USER_KEY).is_none());
        assert!(raw.get(MOCK_USERS_KEY).is_some_and(Value::is_array));
        assert!(raw.get(MOCK_EMAILS_KEY).is_some_and(Value::is_array));
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        tokio::fs::write(&path, b"not json").await.unwrap();
        assert!(matches!(LocalStorage::open(&path).await, Err(LocalStorageError::Serde(_))));
    }
}
