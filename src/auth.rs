use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindowBuilder, WindowEvent};
use tokio::sync::oneshot;
use url::Url;

use crate::error::AuthDenied;
use crate::StoreManager;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1/oauth2/callback";
const AUTH_WINDOW_LABEL: &str = "auth";
/// Grants this close to expiry are treated as already expired.
const EXPIRY_SKEW_SECS: i64 = 60;
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Opaque bearer credential. Never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireMode {
    /// Never prompts; fails fast without a cached grant.
    Silent,
    /// May show the provider's consent/login UI.
    Interactive,
}

impl AcquireMode {
    pub fn is_interactive(self) -> bool {
        matches!(self, AcquireMode::Interactive)
    }
}

#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn acquire(&self, mode: AcquireMode) -> Result<Token, AuthDenied>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    pub client_id: String,
    pub auth_url: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: vec![
                "https://www.googleapis.com/auth/gmail.readonly".to_string(),
                "https://www.googleapis.com/auth/userinfo.profile".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedGrant {
    pub access_token: String,
    /// Unix seconds
    pub expires_at: i64,
}

impl CachedGrant {
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.expires_at.saturating_sub(EXPIRY_SKEW_SECS) > now
    }

    pub fn token(&self) -> Token {
        Token::new(self.access_token.clone())
    }
}

pub fn token_from_cache(grant: Option<&CachedGrant>, now: i64) -> Result<Token, AuthDenied> {
    match grant {
        Some(grant) if grant.is_valid_at(now) => Ok(grant.token()),
        Some(_) => Err(AuthDenied::new("cached grant expired")),
        None => Err(AuthDenied::no_cached_grant()),
    }
}

/// Implicit-grant authorize URL for the configured client.
pub fn authorize_url(config: &OAuthConfig) -> Result<Url, AuthDenied> {
    if config.client_id.trim().is_empty() {
        return Err(AuthDenied::new("no OAuth client id configured"));
    }

    let scope = config.scopes.join(" ");
    Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("response_type", "token"),
            ("scope", scope.as_str()),
            ("include_granted_scopes", "true"),
        ],
    )
    .map_err(|e| AuthDenied::new(format!("invalid auth url: {}", e)))
}

pub fn is_redirect(url: &Url, redirect_uri: &str) -> bool {
    let Ok(expected) = Url::parse(redirect_uri) else {
        return false;
    };
    url.scheme() == expected.scheme()
        && url.host_str() == expected.host_str()
        && url.port_or_known_default() == expected.port_or_known_default()
        && url.path() == expected.path()
}

/// Turn the provider's redirect into a grant. The implicit flow answers in
/// the fragment; some providers report errors in the query instead.
pub fn parse_redirect(url: &Url, now: i64) -> Result<CachedGrant, AuthDenied> {
    let params = url
        .fragment()
        .filter(|f| !f.is_empty())
        .or_else(|| url.query())
        .unwrap_or("");

    let mut access_token = None;
    let mut expires_in = DEFAULT_EXPIRES_IN_SECS;
    for (key, value) in url::form_urlencoded::parse(params.as_bytes()) {
        match key.as_ref() {
            "error" => {
                return Err(AuthDenied::new(format!("provider returned {}", value)));
            }
            "access_token" => access_token = Some(value.into_owned()),
            "expires_in" => {
                expires_in = value
                    .parse::<i64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_EXPIRES_IN_SECS);
            }
            _ => {}
        }
    }

    let access_token = access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthDenied::new("redirect carried no access token"))?;

    Ok(CachedGrant {
        access_token,
        expires_at: now.saturating_add(expires_in),
    })
}

type GrantResult = Result<CachedGrant, AuthDenied>;

struct AuthWindowShared {
    app: AppHandle,
    waiters: Mutex<Vec<oneshot::Sender<GrantResult>>>,
}

impl AuthWindowShared {
    /// Hand the outcome to every pending interactive request. Later calls
    /// find no waiters and do nothing.
    fn finish(&self, result: GrantResult) {
        let waiters: Vec<_> = {
            let mut guard = self.waiters.lock().unwrap_or_else(PoisonError::into_inner);
            guard.drain(..).collect()
        };
        if waiters.is_empty() {
            return;
        }

        match &result {
            Ok(grant) => {
                log::info!("Authorization completed");
                if let Some(store) = self.app.try_state::<StoreManager>() {
                    if let Err(e) = store.set_cached_grant(grant.clone()) {
                        log::warn!("Failed to cache grant: {}", e);
                    }
                }
            }
            Err(denied) => log::info!("Authorization did not complete: {}", denied),
        }

        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }
    }
}

/// Identity provider backed by a webview running the OAuth implicit flow,
/// with the resulting grant cached in the settings store.
#[derive(Clone)]
pub struct WebviewTokenIssuer {
    shared: Arc<AuthWindowShared>,
}

impl WebviewTokenIssuer {
    pub fn new(app: AppHandle) -> Self {
        Self {
            shared: Arc::new(AuthWindowShared {
                app,
                waiters: Mutex::new(Vec::new()),
            }),
        }
    }

    fn cached_token(&self) -> Result<Token, AuthDenied> {
        let store = self
            .shared
            .app
            .try_state::<StoreManager>()
            .ok_or_else(|| AuthDenied::new("settings store not initialized"))?;
        token_from_cache(store.cached_grant().as_ref(), chrono::Utc::now().timestamp())
    }

    fn oauth_config(&self) -> OAuthConfig {
        self.shared
            .app
            .try_state::<StoreManager>()
            .map(|store| store.oauth())
            .unwrap_or_default()
    }

    fn open_auth_window(&self) -> Result<(), AuthDenied> {
        let config = self.oauth_config();
        let url = authorize_url(&config)?;

        let nav_shared = Arc::clone(&self.shared);
        let redirect_uri = config.redirect_uri.clone();
        let window = WebviewWindowBuilder::new(
            &self.shared.app,
            AUTH_WINDOW_LABEL,
            WebviewUrl::External(url),
        )
        .on_navigation(move |url| {
            if !is_redirect(url, &redirect_uri) {
                return true;
            }

            nav_shared.finish(parse_redirect(url, chrono::Utc::now().timestamp()));
            if let Some(auth_window) = nav_shared.app.get_webview_window(AUTH_WINDOW_LABEL) {
                let _ = auth_window.close();
            }
            false
        })
        .title("Authorize Gmail Checker")
        .inner_size(520.0, 680.0)
        .resizable(true)
        .visible(true)
        .build()
        .map_err(|e| AuthDenied::new(format!("failed to create auth window: {}", e)))?;

        let close_shared = Arc::clone(&self.shared);
        window.on_window_event(move |event| {
            if let WindowEvent::Destroyed = event {
                close_shared.finish(Err(AuthDenied::cancelled()));
            }
        });

        Ok(())
    }

    fn focus_auth_window(&self) {
        if let Some(window) = self.shared.app.get_webview_window(AUTH_WINDOW_LABEL) {
            let _ = window.show();
            let _ = window.set_focus();
        }
    }
}

#[async_trait]
impl TokenIssuer for WebviewTokenIssuer {
    async fn acquire(&self, mode: AcquireMode) -> Result<Token, AuthDenied> {
        let cached = self.cached_token();
        if cached.is_ok() || !mode.is_interactive() {
            return cached;
        }

        let (tx, rx) = oneshot::channel();
        let first = {
            let mut waiters = self
                .shared
                .waiters
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            waiters.push(tx);
            waiters.len() == 1
        };

        if first {
            log::info!("Opening authorization window");
            if let Err(denied) = self.open_auth_window() {
                self.shared.finish(Err(denied));
            }
        } else {
            self.focus_auth_window();
        }

        match rx.await {
            Ok(Ok(grant)) => Ok(grant.token()),
            Ok(Err(denied)) => Err(denied),
            Err(_) => Err(AuthDenied::cancelled()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn config() -> OAuthConfig {
        OAuthConfig {
            client_id: "client-123.apps.example.test".to_string(),
            ..OAuthConfig::default()
        }
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = Token::new("ya29.secret");
        assert_eq!(format!("{:?}", token), "Token(<redacted>)");
        assert_eq!(token.as_str(), "ya29.secret");
    }

    #[test]
    fn silent_cache_lookup() {
        let fresh = CachedGrant {
            access_token: "fresh".to_string(),
            expires_at: NOW + 600,
        };
        let nearly_expired = CachedGrant {
            access_token: "stale".to_string(),
            expires_at: NOW + 30,
        };

        assert_eq!(token_from_cache(Some(&fresh), NOW).unwrap().as_str(), "fresh");
        assert_eq!(
            token_from_cache(Some(&nearly_expired), NOW).unwrap_err(),
            AuthDenied::new("cached grant expired")
        );
        assert_eq!(
            token_from_cache(None, NOW).unwrap_err(),
            AuthDenied::no_cached_grant()
        );
    }

    #[test]
    fn authorize_url_carries_client_and_scopes() {
        let url = authorize_url(&config()).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(url.as_str().starts_with(GOOGLE_AUTH_URL));
        assert!(pairs.contains(&("response_type".to_string(), "token".to_string())));
        assert!(pairs.contains(&(
            "client_id".to_string(),
            "client-123.apps.example.test".to_string()
        )));
        let scope = pairs.iter().find(|(k, _)| k == "scope").map(|(_, v)| v.as_str());
        assert_eq!(
            scope,
            Some(concat!(
                "https://www.googleapis.com/auth/gmail.readonly ",
                "https://www.googleapis.com/auth/userinfo.profile",
            ))
        );
    }

    #[test]
    fn authorize_url_requires_client_id() {
        assert!(authorize_url(&OAuthConfig::default()).is_err());
    }

    #[test]
    fn redirect_detection_ignores_fragment_and_query() {
        let hit = Url::parse("http://127.0.0.1/oauth2/callback#access_token=a").unwrap();
        let other_path = Url::parse("http://127.0.0.1/elsewhere").unwrap();
        let provider = Url::parse("https://accounts.google.com/signin").unwrap();

        assert!(is_redirect(&hit, DEFAULT_REDIRECT_URI));
        assert!(!is_redirect(&other_path, DEFAULT_REDIRECT_URI));
        assert!(!is_redirect(&provider, DEFAULT_REDIRECT_URI));
    }

    #[test]
    fn redirect_with_token_becomes_grant() {
        let url = Url::parse(concat!(
            "http://127.0.0.1/oauth2/callback",
            "#access_token=ya29.abc&token_type=Bearer&expires_in=3599",
        ))
        .unwrap();
        let grant = parse_redirect(&url, NOW).unwrap();
        assert_eq!(grant.access_token, "ya29.abc");
        assert_eq!(grant.expires_at, NOW + 3599);
    }

    #[test]
    fn huge_expires_in_saturates() {
        let url = Url::parse(concat!(
            "http://127.0.0.1/oauth2/callback",
            "#access_token=ya29.abc&expires_in=9223372036854775807",
        ))
        .unwrap();
        let grant = parse_redirect(&url, NOW).unwrap();
        assert_eq!(grant.expires_at, i64::MAX);
        assert!(grant.is_valid_at(NOW));
    }

    #[test]
    fn non_positive_expires_in_uses_default() {
        let url =
            Url::parse("http://127.0.0.1/oauth2/callback#access_token=a&expires_in=-5").unwrap();
        let grant = parse_redirect(&url, NOW).unwrap();
        assert_eq!(grant.expires_at, NOW + DEFAULT_EXPIRES_IN_SECS);
    }

    #[test]
    fn corrupt_expiry_is_expired() {
        let grant = CachedGrant {
            access_token: "corrupt".to_string(),
            expires_at: i64::MIN,
        };
        assert!(!grant.is_valid_at(NOW));
    }

    #[test]
    fn redirect_with_error_is_denied() {
        let url = Url::parse("http://127.0.0.1/oauth2/callback#error=access_denied").unwrap();
        assert_eq!(
            parse_redirect(&url, NOW).unwrap_err(),
            AuthDenied::new("provider returned access_denied")
        );

        let query = Url::parse("http://127.0.0.1/oauth2/callback?error=access_denied").unwrap();
        assert!(parse_redirect(&query, NOW).is_err());
    }

    #[test]
    fn redirect_without_token_is_denied() {
        let url = Url::parse("http://127.0.0.1/oauth2/callback#state=x").unwrap();
        assert!(parse_redirect(&url, NOW).is_err());
    }
}
