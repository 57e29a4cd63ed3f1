use serde::{Deserialize, Serialize};

const NEUTRAL_RGB: (u8, u8, u8) = (0x9E, 0x9E, 0x9E);
const ALERT_RGB: (u8, u8, u8) = (0xF4, 0x43, 0x36);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BadgeColor {
    Neutral,
    Alert,
}

impl BadgeColor {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            BadgeColor::Neutral => NEUTRAL_RGB,
            BadgeColor::Alert => ALERT_RGB,
        }
    }
}

/// What the tray badge shows: short text, background color and hover tooltip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeState {
    pub text: String,
    pub color: BadgeColor,
    pub tooltip: String,
}

impl BadgeState {
    /// Badge for a user that has not granted access yet.
    pub fn unauthenticated() -> Self {
        Self {
            text: "?".to_string(),
            color: BadgeColor::Neutral,
            tooltip: "Click to authorize Gmail".to_string(),
        }
    }

    pub fn for_unread_count(count: u64) -> Self {
        if count == 0 {
            return Self {
                text: count.to_string(),
                color: BadgeColor::Neutral,
                tooltip: "No unread mail".to_string(),
            };
        }

        Self {
            text: count.to_string(),
            color: BadgeColor::Alert,
            tooltip: format!("{} unread mail", count),
        }
    }
}
