use std::fmt;
use std::str::FromStr;

use crate::api::Profile;

/// Icon shipped with the app, used for the authorization prompt.
pub const APP_ICON: &str = "icons/icon.png";
pub const APP_TITLE: &str = "Gmail Checker";

/// Every notification the app can raise. Activation is dispatched with an
/// exhaustive match on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NotificationId {
    StartAuth,
    ShowProfile,
}

impl NotificationId {
    pub const ALL: [NotificationId; 2] = [NotificationId::StartAuth, NotificationId::ShowProfile];

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationId::StartAuth => "start-auth",
            NotificationId::ShowProfile => "show-profile",
        }
    }

    /// Stable numeric id for the OS notification center.
    pub fn os_id(self) -> i32 {
        match self {
            NotificationId::StartAuth => 1,
            NotificationId::ShowProfile => 2,
        }
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification id: {0}")]
pub struct UnknownNotificationId(pub String);

impl FromStr for NotificationId {
    type Err = UnknownNotificationId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownNotificationId(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub icon: String,
    pub title: String,
    pub message: String,
}

impl Notification {
    /// Prompt asking the user to authorize Gmail access.
    pub fn start_auth() -> Self {
        Self {
            id: NotificationId::StartAuth,
            icon: APP_ICON.to_string(),
            title: APP_TITLE.to_string(),
            message: "Click here to authorize access to Gmail".to_string(),
        }
    }

    /// Welcome shown after an interactive sign-in.
    pub fn show_profile(profile: &Profile) -> Self {
        Self {
            id: NotificationId::ShowProfile,
            icon: profile.image_url.clone(),
            title: format!("Welcome {}", profile.display_name),
            message: "Gmail checker is now active".to_string(),
        }
    }
}
