use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::Token;
use crate::error::RequestFailed;

const GMAIL_INBOX_LABEL_URL: &str = "https://www.googleapis.com/gmail/v1/users/me/labels/INBOX";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const GMAIL_WEB_URL: &str = "https://mail.google.com";

/// URLs the controller talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Label resource carrying `threadsUnread`
    pub unread_count_url: String,
    /// Profile of the signed-in user
    pub profile_url: String,
    /// Page opened when the user clicks the tray icon
    pub resource_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            unread_count_url: GMAIL_INBOX_LABEL_URL.to_string(),
            profile_url: USERINFO_URL.to_string(),
            resource_url: GMAIL_WEB_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub display_name: String,
    pub image_url: String,
}

/// Bearer-authenticated JSON GET.
#[async_trait]
pub trait AuthorizedGet: Send + Sync {
    async fn get_json(&self, url: &str, token: &Token) -> Result<Value, RequestFailed>;
}

pub struct ReqwestClient {
    client: reqwest::Client,
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AuthorizedGet for ReqwestClient {
    async fn get_json(&self, url: &str, token: &Token) -> Result<Value, RequestFailed> {
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token.as_str())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RequestFailed::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestFailed::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| RequestFailed::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct LabelResource {
    #[serde(rename = "threadsUnread")]
    threads_unread: u64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageField {
    Url(String),
    Nested { url: String },
}

/// Accepts both the Google+ person shape (`displayName`, `image.url`) and
/// the userinfo shape (`name`, `picture`).
#[derive(Debug, Deserialize)]
struct ProfileResource {
    #[serde(alias = "displayName")]
    name: String,
    #[serde(default, alias = "picture")]
    image: Option<ImageField>,
}

pub fn parse_unread_count(url: &str, body: Value) -> Result<u64, RequestFailed> {
    let label: LabelResource = serde_json::from_value(body).map_err(|e| RequestFailed::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    Ok(label.threads_unread)
}

pub fn parse_profile(url: &str, body: Value) -> Result<Profile, RequestFailed> {
    let resource: ProfileResource =
        serde_json::from_value(body).map_err(|e| RequestFailed::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let image_url = match resource.image {
        Some(ImageField::Url(url)) | Some(ImageField::Nested { url }) => url,
        None => String::new(),
    };

    Ok(Profile {
        display_name: resource.name,
        image_url,
    })
}
