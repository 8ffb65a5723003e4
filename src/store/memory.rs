use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{Role, Setting, Store, StoreError, User};

const MAX_SETTING_KEY_LEN: usize = 64;

/// In-process store. Starts disconnected; every call fails with
/// `Unavailable` until `connect` succeeds and after `close`.
#[derive(Default)]
pub struct MemoryStore {
    connected: AtomicBool,
    users: RwLock<HashMap<String, User>>,
    settings: RwLock<BTreeMap<String, Setting>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users.into_iter().map(|u| (u.id.clone(), u)).collect();
        Self {
            users: RwLock::new(users),
            ..Self::default()
        }
    }

    fn ensure_connected(&self) -> Result<(), StoreError> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("store is not connected".to_string()))
        }
    }

    fn validate_setting(key: &str, value: &Value) -> Result<(), StoreError> {
        if key.is_empty() || key.len() > MAX_SETTING_KEY_LEN {
            return Err(StoreError::Validation(format!(
                "setting key must be 1-{} characters",
                MAX_SETTING_KEY_LEN
            )));
        }
        if !key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-'))
        {
            return Err(StoreError::Validation(format!("setting key '{}' has invalid characters", key)));
        }
        if value.is_null() {
            return Err(StoreError::Validation(format!("setting '{}' requires a value", key)));
        }
        Ok(())
    }

    async fn update_user(&self, id: &str, apply: impl FnOnce(&mut User)) -> Result<User, StoreError> {
        self.ensure_connected()?;
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("user '{}'", id)))?;
        apply(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn connect(&self) -> Result<(), StoreError> {
        self.connected.store(true, Ordering::Release);
        tracing::info!("memory store connected");
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.connected.store(false, Ordering::Release);
        tracing::info!("memory store closed");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.ensure_connected()
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.ensure_connected()?;
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn get_user(&self, id: &str) -> Result<User, StoreError> {
        self.ensure_connected()?;
        self.users
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user '{}'", id)))
    }

    async fn set_user_role(&self, id: &str, role: Role) -> Result<User, StoreError> {
        self.update_user(id, |user| user.role = role).await
    }

    async fn suspend_user(&self, id: &str) -> Result<User, StoreError> {
        self.update_user(id, |user| user.suspended = true).await
    }

    async fn list_settings(&self) -> Result<Vec<Setting>, StoreError> {
        self.ensure_connected()?;
        Ok(self.settings.read().await.values().cloned().collect())
    }

    async fn put_setting(&self, key: &str, value: Value, updated_by: &str) -> Result<Setting, StoreError> {
        self.ensure_connected()?;
        Self::validate_setting(key, &value)?;

        let setting = Setting {
            key: key.to_string(),
            value,
            updated_by: updated_by.to_string(),
            updated_at: Utc::now(),
        };
        self.settings.write().await.insert(key.to_string(), setting.clone());
        Ok(setting)
    }
}
