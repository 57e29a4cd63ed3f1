//! The authentication-and-polling state machine.
//!
//! Every external trigger (startup, alarm tick, tray click, notification
//! activation) enters through one `on_*` method. Each call is an independent
//! attempt: overlapping calls are neither serialized nor de-duplicated, and
//! the badge ends up showing whichever lookup completed last.

use std::sync::{Arc, Mutex, PoisonError};

use crate::api::{parse_profile, parse_unread_count, AuthorizedGet, Endpoints, Profile};
use crate::auth::{AcquireMode, Token, TokenIssuer};
use crate::badge::BadgeState;
use crate::error::RequestFailed;
use crate::notification::{Notification, NotificationId};
use crate::scheduler::POLL_ALARM;
use crate::surface::UiSurface;

pub struct AuthPollController {
    issuer: Arc<dyn TokenIssuer>,
    http: Arc<dyn AuthorizedGet>,
    surface: Arc<dyn UiSurface>,
    endpoints: Endpoints,
    badge: Mutex<Option<BadgeState>>,
}

impl AuthPollController {
    pub fn new(
        issuer: Arc<dyn TokenIssuer>,
        http: Arc<dyn AuthorizedGet>,
        surface: Arc<dyn UiSurface>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            issuer,
            http,
            surface,
            endpoints,
            badge: Mutex::new(None),
        }
    }

    /// Last badge handed to the surface, if any.
    pub fn badge(&self) -> Option<BadgeState> {
        self.badge
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn on_startup(&self) {
        log::info!("Startup: probing for an existing grant");
        self.set_badge(BadgeState::unauthenticated());
        self.request_token_silent().await;
    }

    pub async fn on_scheduled_tick(&self, alarm_name: &str) {
        if alarm_name != POLL_ALARM {
            log::debug!("Ignoring alarm {}", alarm_name);
            return;
        }
        self.request_token_silent().await;
    }

    /// "Check now" from the tray menu.
    pub async fn on_manual_refresh(&self) {
        self.request_token_silent().await;
    }

    /// Tray icon click: open Gmail if we already have access, otherwise ask
    /// for it once.
    pub async fn on_user_activation(&self) {
        match self.issuer.acquire(AcquireMode::Silent).await {
            Ok(_token) => self.open_resource(),
            Err(denied) => {
                log::info!("Silent probe on click failed ({}), asking interactively", denied);
                match self.issuer.acquire(AcquireMode::Interactive).await {
                    Ok(_token) => self.open_resource(),
                    Err(denied) => {
                        log::info!("Interactive authorization failed: {}", denied);
                        self.show_auth_needed();
                    }
                }
            }
        }
    }

    pub async fn on_notification_activation(&self, id: NotificationId) {
        // Cleared first: a failed interactive request shows a fresh
        // start-auth prompt, which must survive.
        self.clear_notification(id);

        match id {
            NotificationId::StartAuth => self.request_token_interactive().await,
            NotificationId::ShowProfile => {}
        }
    }

    async fn request_token_silent(&self) {
        match self.issuer.acquire(AcquireMode::Silent).await {
            Ok(token) => self.poll_unread_count(&token).await,
            Err(denied) => {
                log::info!("Silent token request failed: {}", denied);
                self.show_auth_needed();
            }
        }
    }

    async fn request_token_interactive(&self) {
        match self.issuer.acquire(AcquireMode::Interactive).await {
            Ok(token) => {
                tokio::join!(self.poll_unread_count(&token), self.fetch_profile(&token));
            }
            Err(denied) => {
                log::info!("Interactive token request failed: {}", denied);
                self.show_auth_needed();
            }
        }
    }

    async fn poll_unread_count(&self, token: &Token) {
        match self.fetch_unread_count(token).await {
            Ok(count) => {
                log::debug!("Unread count: {}", count);
                self.set_badge(BadgeState::for_unread_count(count));
            }
            // Stale but not wrong: keep whatever the badge says.
            Err(e) => log::warn!("Unread count lookup failed: {}", e),
        }
    }

    async fn fetch_profile(&self, token: &Token) {
        match self.fetch_profile_resource(token).await {
            Ok(profile) => self.show_notification(&Notification::show_profile(&profile)),
            Err(e) => log::warn!("Profile lookup failed: {}", e),
        }
    }

    async fn fetch_unread_count(&self, token: &Token) -> Result<u64, RequestFailed> {
        let url = &self.endpoints.unread_count_url;
        let body = self.http.get_json(url, token).await?;
        parse_unread_count(url, body)
    }

    async fn fetch_profile_resource(&self, token: &Token) -> Result<Profile, RequestFailed> {
        let url = &self.endpoints.profile_url;
        let body = self.http.get_json(url, token).await?;
        parse_profile(url, body)
    }

    fn show_auth_needed(&self) {
        self.set_badge(BadgeState::unauthenticated());
        self.show_notification(&Notification::start_auth());
    }

    fn set_badge(&self, badge: BadgeState) {
        // Stored and rendered under one lock so the two never disagree.
        let mut current = self.badge.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = self.surface.set_badge(&badge) {
            log::warn!("Failed to render badge: {}", e);
        }
        *current = Some(badge);
    }

    fn show_notification(&self, notification: &Notification) {
        if let Err(e) = self.surface.show_notification(notification) {
            log::warn!("Failed to show {} notification: {}", notification.id, e);
        }
    }

    fn clear_notification(&self, id: NotificationId) {
        if let Err(e) = self.surface.clear_notification(id) {
            log::warn!("Failed to clear {} notification: {}", id, e);
        }
    }

    fn open_resource(&self) {
        if let Err(e) = self.surface.open_resource(&self.endpoints.resource_url) {
            log::warn!("{}", e);
        }
    }
}
