//! Error types shared by the controller and its collaborators.
//!
//! None of these are fatal: the controller resolves [`AuthDenied`] by
//! re-offering authorization and [`RequestFailed`] by keeping the last
//! badge it rendered.

/// The identity provider refused to hand out a token.
///
/// Covers both "no cached grant" on a silent probe and a user cancelling
/// the interactive flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("authentication denied: {reason}")]
pub struct AuthDenied {
    pub reason: String,
}

impl AuthDenied {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn no_cached_grant() -> Self {
        Self::new("no cached grant")
    }

    pub fn cancelled() -> Self {
        Self::new("authorization window closed")
    }
}

/// A downstream GET did not produce a usable response.
#[derive(Debug, thiserror::Error)]
pub enum RequestFailed {
    /// Connection, TLS or body read failure.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Server answered with a non-success status.
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Body was not the JSON shape we expected.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Failure reading or writing `settings.json`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to resolve app data dir: {0}")]
    AppDir(String),
}

/// Failure rasterising the tray badge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("badge size must be non-zero")]
    EmptyCanvas,
}

/// A tray or notification call into the shell failed.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("tray error: {0}")]
    Tray(String),

    #[error("notification error: {0}")]
    Notification(String),

    #[error("failed to open {url}: {message}")]
    Open { url: String, message: String },
}
