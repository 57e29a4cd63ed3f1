use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use tauri::menu::{Menu, MenuItem, PredefinedMenuItem};
use tauri::{AppHandle, Manager, Runtime};
use tauri_plugin_notification::NotificationExt;
use tauri_plugin_opener::OpenerExt;

use crate::badge::BadgeState;
use crate::error::SurfaceError;
use crate::notification::{Notification, NotificationId};
use crate::tray_icon_renderer::TrayIconRenderer;
use crate::StoreManager;

pub const TRAY_ID: &str = "gmail-checker";
pub const MENU_OPEN: &str = "open";
pub const MENU_REFRESH: &str = "refresh";
pub const MENU_QUIT: &str = "quit";

const BADGE_SIZE_PX: u32 = 16;

/// Where the controller's visible state goes. Every call is a fire-and-forget
/// side effect; the controller never reads anything back.
pub trait UiSurface: Send + Sync {
    fn set_badge(&self, badge: &BadgeState) -> Result<(), SurfaceError>;
    fn show_notification(&self, notification: &Notification) -> Result<(), SurfaceError>;
    fn clear_notification(&self, id: NotificationId) -> Result<(), SurfaceError>;
    fn open_resource(&self, url: &str) -> Result<(), SurfaceError>;
}

/// Tray menu: one entry per pending notification (selecting it activates
/// the notification), then the fixed actions.
pub fn build_tray_menu<'a, R: Runtime>(
    app: &AppHandle<R>,
    pending: impl IntoIterator<Item = &'a Notification>,
) -> tauri::Result<Menu<R>> {
    let menu = Menu::new(app)?;

    let mut has_pending = false;
    for notification in pending {
        let label = format!("{}: {}", notification.title, notification.message);
        let item = MenuItem::with_id(app, notification.id.as_str(), label, true, None::<&str>)?;
        menu.append(&item)?;
        has_pending = true;
    }
    if has_pending {
        menu.append(&PredefinedMenuItem::separator(app)?)?;
    }

    let open_i = MenuItem::with_id(app, MENU_OPEN, "Open Gmail", true, None::<&str>)?;
    let refresh_i = MenuItem::with_id(app, MENU_REFRESH, "Check now", true, None::<&str>)?;
    let quit_i = MenuItem::with_id(app, MENU_QUIT, "Quit", true, None::<&str>)?;
    menu.append(&open_i)?;
    menu.append(&refresh_i)?;
    menu.append(&quit_i)?;

    Ok(menu)
}

/// Tray icon, tray menu, OS notifications and the default browser.
///
/// Desktop notifications have no click callback, so pending notifications
/// are mirrored into the tray menu and activated from there.
pub struct TauriSurface {
    app: AppHandle,
    renderer: TrayIconRenderer,
    pending: Mutex<BTreeMap<NotificationId, Notification>>,
}

impl TauriSurface {
    pub fn new(app: AppHandle, renderer: TrayIconRenderer) -> Self {
        Self {
            app,
            renderer,
            pending: Mutex::new(BTreeMap::new()),
        }
    }

    fn tray(&self) -> Result<tauri::tray::TrayIcon, SurfaceError> {
        self.app
            .tray_by_id(TRAY_ID)
            .ok_or_else(|| SurfaceError::Tray("tray not initialized".to_string()))
    }

    fn rebuild_menu(
        &self,
        pending: &BTreeMap<NotificationId, Notification>,
    ) -> Result<(), SurfaceError> {
        let menu = build_tray_menu(&self.app, pending.values())
            .map_err(|e| SurfaceError::Tray(e.to_string()))?;
        self.tray()?
            .set_menu(Some(menu))
            .map_err(|e| SurfaceError::Tray(e.to_string()))
    }

    fn toasts_enabled(&self) -> bool {
        self.app
            .try_state::<StoreManager>()
            .map(|store| store.show_notifications())
            .unwrap_or(true)
    }
}

impl UiSurface for TauriSurface {
    fn set_badge(&self, badge: &BadgeState) -> Result<(), SurfaceError> {
        let image = self
            .renderer
            .render_badge(badge, BADGE_SIZE_PX)?
            .into_tauri_image();
        let tray = self.tray()?;
        tray.set_icon(Some(image))
            .map_err(|e| SurfaceError::Tray(e.to_string()))?;
        tray.set_tooltip(Some(&badge.tooltip))
            .map_err(|e| SurfaceError::Tray(e.to_string()))
    }

    fn show_notification(&self, notification: &Notification) -> Result<(), SurfaceError> {
        {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.insert(notification.id, notification.clone());
            if let Err(e) = self.rebuild_menu(&pending) {
                log::warn!("Failed to list {} in tray menu: {}", notification.id, e);
            }
        }

        if !self.toasts_enabled() {
            log::debug!("Notifications disabled, {} only listed in tray menu", notification.id);
            return Ok(());
        }

        self.app
            .notification()
            .builder()
            .id(notification.id.os_id())
            .title(&notification.title)
            .body(&notification.message)
            .icon(&notification.icon)
            .show()
            .map_err(|e| SurfaceError::Notification(e.to_string()))
    }

    fn clear_notification(&self, id: NotificationId) -> Result<(), SurfaceError> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.remove(&id).is_some() {
            self.rebuild_menu(&pending)?;
        }
        Ok(())
    }

    fn open_resource(&self, url: &str) -> Result<(), SurfaceError> {
        self.app
            .opener()
            .open_url(url, None::<&str>)
            .map_err(|e| SurfaceError::Open {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}
