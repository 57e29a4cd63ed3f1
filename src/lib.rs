mod api;
mod auth;
mod badge;
mod controller;
mod error;
mod notification;
mod scheduler;
mod store;
mod surface;
mod tray_icon_renderer;

pub use api::{parse_profile, parse_unread_count, AuthorizedGet, Endpoints, Profile, ReqwestClient};
pub use auth::{
    authorize_url, is_redirect, parse_redirect, token_from_cache, AcquireMode, CachedGrant,
    OAuthConfig, Token, TokenIssuer, WebviewTokenIssuer,
};
pub use badge::{BadgeColor, BadgeState};
pub use controller::AuthPollController;
pub use error::{AuthDenied, RenderError, RequestFailed, StoreError, SurfaceError};
pub use notification::{Notification, NotificationId, UnknownNotificationId, APP_ICON, APP_TITLE};
pub use scheduler::{Alarm, POLL_ALARM};
pub use store::{init_store_manager, AppSettings, StoreManager};
pub use surface::{
    build_tray_menu, TauriSurface, UiSurface, MENU_OPEN, MENU_QUIT, MENU_REFRESH, TRAY_ID,
};
pub use tray_icon_renderer::{DigitAtlas, GlyphBitmap, TrayIconRenderer, TrayImage};
