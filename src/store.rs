use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tauri::{AppHandle, Manager};

use crate::api::Endpoints;
use crate::auth::{CachedGrant, OAuthConfig};
use crate::error::StoreError;

const STORE_FILENAME: &str = "settings.json";
const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// OAuth client registration
    pub oauth: OAuthConfig,
    /// Gmail and profile URLs
    pub endpoints: Endpoints,
    /// Minutes between scheduled unread-count checks
    pub poll_interval_minutes: u64,
    /// Whether to raise OS notifications (the tray menu still lists them)
    pub show_notifications: bool,
    /// Grant cached by the identity provider
    pub cached_grant: Option<CachedGrant>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            oauth: OAuthConfig::default(),
            endpoints: Endpoints::default(),
            poll_interval_minutes: DEFAULT_POLL_INTERVAL_MINUTES,
            show_notifications: true,
            cached_grant: None,
        }
    }
}

pub struct StoreManager {
    settings_path: PathBuf,
    settings: Mutex<AppSettings>,
}

impl StoreManager {
    /// Create a new store manager with the given app directory
    pub fn new(app_dir: PathBuf) -> Result<Self, StoreError> {
        let settings_path = app_dir.join(STORE_FILENAME);

        // Load existing settings or create defaults
        let settings = if settings_path.exists() {
            Self::load_settings_from_disk(&settings_path)?
        } else {
            AppSettings::default()
        };

        Ok(Self {
            settings_path,
            settings: Mutex::new(settings),
        })
    }

    fn load_settings_from_disk(path: &Path) -> Result<AppSettings, StoreError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_settings_to_disk(path: &Path, settings: &AppSettings) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(settings)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, AppSettings> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a copy of current settings
    pub fn get_settings(&self) -> AppSettings {
        self.lock().clone()
    }

    /// Update settings and persist to disk
    pub fn update_settings<F>(&self, updater: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut AppSettings),
    {
        let mut settings = self.lock();
        updater(&mut settings);
        Self::save_settings_to_disk(&self.settings_path, &settings)
    }

    pub fn cached_grant(&self) -> Option<CachedGrant> {
        self.lock().cached_grant.clone()
    }

    pub fn set_cached_grant(&self, grant: CachedGrant) -> Result<(), StoreError> {
        self.update_settings(|s| {
            s.cached_grant = Some(grant);
        })
    }

    pub fn oauth(&self) -> OAuthConfig {
        self.lock().oauth.clone()
    }

    pub fn endpoints(&self) -> Endpoints {
        self.lock().endpoints.clone()
    }

    pub fn show_notifications(&self) -> bool {
        self.lock().show_notifications
    }

    /// Never shorter than one minute.
    pub fn poll_interval(&self) -> Duration {
        let minutes = self.lock().poll_interval_minutes.max(1);
        Duration::from_secs(minutes * 60)
    }
}

/// Initialize the store manager and attach to app
pub fn init_store_manager(app: &AppHandle) -> Result<(), StoreError> {
    let app_dir = app
        .path()
        .app_data_dir()
        .map_err(|e| StoreError::AppDir(e.to_string()))?;

    std::fs::create_dir_all(&app_dir)?;

    let store_manager = StoreManager::new(app_dir)?;
    app.manage(store_manager);

    Ok(())
}
