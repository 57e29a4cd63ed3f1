#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gmail_checker::{
    AcquireMode, AuthDenied, AuthPollController, AuthorizedGet, BadgeState, Endpoints,
    Notification, NotificationId, RequestFailed, SurfaceError, Token, TokenIssuer, UiSurface,
};
use serde_json::Value;
use tokio::sync::oneshot;

pub const LABEL_URL: &str = "https://api.test/labels/INBOX";
pub const PROFILE_URL: &str = "https://api.test/profile";
pub const RESOURCE_URL: &str = "https://mail.test";

pub fn endpoints() -> Endpoints {
    Endpoints {
        unread_count_url: LABEL_URL.to_string(),
        profile_url: PROFILE_URL.to_string(),
        resource_url: RESOURCE_URL.to_string(),
    }
}

// ----------------------------------------------------------------------------
// Token issuer
// ----------------------------------------------------------------------------

pub struct FakeIssuer {
    silent: Result<Token, AuthDenied>,
    interactive: Result<Token, AuthDenied>,
    calls: Mutex<Vec<AcquireMode>>,
}

impl FakeIssuer {
    pub fn new(silent: Result<Token, AuthDenied>, interactive: Result<Token, AuthDenied>) -> Self {
        Self {
            silent,
            interactive,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Both modes succeed.
    pub fn granting() -> Self {
        Self::new(Ok(Token::new("cached")), Ok(Token::new("fresh")))
    }

    /// No cached grant, user completes the interactive flow.
    pub fn needs_consent() -> Self {
        Self::new(Err(AuthDenied::no_cached_grant()), Ok(Token::new("fresh")))
    }

    /// No cached grant and the user cancels.
    pub fn denying() -> Self {
        Self::new(Err(AuthDenied::no_cached_grant()), Err(AuthDenied::cancelled()))
    }

    pub fn calls(&self) -> Vec<AcquireMode> {
        self.calls.lock().unwrap().clone()
    }

    pub fn interactive_calls(&self) -> usize {
        self.calls()
            .into_iter()
            .filter(|mode| mode.is_interactive())
            .count()
    }
}

#[async_trait]
impl TokenIssuer for FakeIssuer {
    async fn acquire(&self, mode: AcquireMode) -> Result<Token, AuthDenied> {
        self.calls.lock().unwrap().push(mode);
        match mode {
            AcquireMode::Silent => self.silent.clone(),
            AcquireMode::Interactive => self.interactive.clone(),
        }
    }
}

// ----------------------------------------------------------------------------
// HTTP
// ----------------------------------------------------------------------------

#[derive(Clone)]
pub enum Reply {
    Json(Value),
    Fail,
    /// Parks the request until the test calls [`FakeHttp::resolve`].
    Gated,
}

pub struct FakeHttp {
    replies: Mutex<HashMap<String, Reply>>,
    pending: Mutex<Vec<Option<oneshot::Sender<Value>>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            pending: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(self, url: &str, reply: Reply) -> Self {
        self.set(url, reply);
        self
    }

    pub fn set(&self, url: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    /// URLs requested, in order.
    pub fn urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    /// Bearer tokens sent, in order.
    pub fn tokens(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn resolve(&self, index: usize, body: Value) {
        let sender = self.pending.lock().unwrap()[index]
            .take()
            .expect("request already resolved");
        sender.send(body).expect("request was dropped");
    }
}

#[async_trait]
impl AuthorizedGet for FakeHttp {
    async fn get_json(&self, url: &str, token: &Token) -> Result<Value, RequestFailed> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), token.as_str().to_string()));

        let reply = self.replies.lock().unwrap().get(url).cloned();
        match reply {
            Some(Reply::Json(body)) => Ok(body),
            Some(Reply::Gated) => {
                let (tx, rx) = oneshot::channel();
                self.pending.lock().unwrap().push(Some(tx));
                rx.await.map_err(|_| RequestFailed::Transport {
                    url: url.to_string(),
                    message: "gate dropped".to_string(),
                })
            }
            Some(Reply::Fail) | None => Err(RequestFailed::Status {
                url: url.to_string(),
                status: 500,
            }),
        }
    }
}

// ----------------------------------------------------------------------------
// UI surface
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Badge(BadgeState),
    Show(Notification),
    Clear(NotificationId),
    Open(String),
}

#[derive(Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn shown(&self, id: NotificationId) -> Vec<Notification> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SurfaceEvent::Show(n) if n.id == id => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn notifications_shown(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, SurfaceEvent::Show(_)))
            .count()
    }

    pub fn last_badge(&self) -> Option<BadgeState> {
        self.events().into_iter().rev().find_map(|event| match event {
            SurfaceEvent::Badge(badge) => Some(badge),
            _ => None,
        })
    }

    pub fn opened(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SurfaceEvent::Open(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: SurfaceEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl UiSurface for RecordingSurface {
    fn set_badge(&self, badge: &BadgeState) -> Result<(), SurfaceError> {
        self.push(SurfaceEvent::Badge(badge.clone()));
        Ok(())
    }

    fn show_notification(&self, notification: &Notification) -> Result<(), SurfaceError> {
        self.push(SurfaceEvent::Show(notification.clone()));
        Ok(())
    }

    fn clear_notification(&self, id: NotificationId) -> Result<(), SurfaceError> {
        self.push(SurfaceEvent::Clear(id));
        Ok(())
    }

    fn open_resource(&self, url: &str) -> Result<(), SurfaceError> {
        self.push(SurfaceEvent::Open(url.to_string()));
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Harness
// ----------------------------------------------------------------------------

pub struct Harness {
    pub controller: Arc<AuthPollController>,
    pub issuer: Arc<FakeIssuer>,
    pub http: Arc<FakeHttp>,
    pub surface: Arc<RecordingSurface>,
}

impl Harness {
    pub fn new(issuer: FakeIssuer, http: FakeHttp) -> Self {
        let issuer = Arc::new(issuer);
        let http = Arc::new(http);
        let surface = Arc::new(RecordingSurface::default());
        let controller = Arc::new(AuthPollController::new(
            issuer.clone(),
            http.clone(),
            surface.clone(),
            endpoints(),
        ));
        Self {
            controller,
            issuer,
            http,
            surface,
        }
    }
}
