//! Open platform HTTP client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use larkbridge_core::config::LarkSettings;

use crate::error::{LarkError, LarkResult};
use crate::store::ChatStore;

use super::ChatPlatform;

const TOKEN_TIMEOUT: Duration = Duration::from_secs(5);
const SEND_TIMEOUT: Duration = Duration::from_secs(10);
const PATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Interactive card with a single markdown block
pub fn markdown_card(content: &str) -> Value {
    json!({
        "config": { "wide_screen_mode": true },
        "elements": [
            { "tag": "div", "text": { "tag": "lark_md", "content": content } }
        ]
    })
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: Option<String>,
    #[serde(default)]
    expire: u64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    bot: Value,
}

impl ApiResponse {
    fn into_ok(self) -> LarkResult<Self> {
        if self.code == 0 {
            Ok(self)
        } else {
            Err(LarkError::Api {
                code: self.code,
                msg: self.msg,
            })
        }
    }
}

/// Client for the Lark/Feishu open platform
///
/// The tenant access token is cached in the chat store until shortly before
/// it expires.
pub struct LarkClient {
    http: reqwest::Client,
    settings: LarkSettings,
    store: Arc<ChatStore>,
}

impl LarkClient {
    pub fn new(settings: LarkSettings, store: Arc<ChatStore>) -> LarkResult<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, settings, store })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    /// Tenant access token, from cache or freshly issued
    pub async fn access_token(&self) -> LarkResult<String> {
        if let Some(token) = self.store.access_token() {
            return Ok(token);
        }

        let response: TokenResponse = self
            .http
            .post(self.url("/open-apis/auth/v3/tenant_access_token/internal"))
            .timeout(TOKEN_TIMEOUT)
            .json(&json!({
                "app_id": self.settings.app_id,
                "app_secret": self.settings.app_secret,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.code != 0 {
            return Err(LarkError::Api {
                code: response.code,
                msg: response.msg,
            });
        }
        let token = response
            .tenant_access_token
            .ok_or_else(|| LarkError::InvalidResponse("token response without tenant_access_token".to_string()))?;

        self.store.set_access_token(&token, response.expire);
        debug!(expire = response.expire, "issued tenant access token");
        Ok(token)
    }
}

#[async_trait]
impl ChatPlatform for LarkClient {
    async fn send_message(&self, chat_id: &str, content: &str) -> LarkResult<String> {
        let token = self.access_token().await?;
        let card = markdown_card(content).to_string();

        let response: ApiResponse = self
            .http
            .post(self.url("/open-apis/im/v1/messages"))
            .query(&[("receive_id_type", "chat_id")])
            .bearer_auth(token)
            .timeout(SEND_TIMEOUT)
            .json(&json!({
                "receive_id": chat_id,
                "msg_type": "interactive",
                "content": card,
            }))
            .send()
            .await?
            .json()
            .await?;

        let response = response.into_ok()?;
        let message_id = response
            .data
            .get("message_id")
            .and_then(Value::as_str)
            .ok_or_else(|| LarkError::InvalidResponse("send response without message_id".to_string()))?;
        info!(chat_id, message_id, "sent message");
        Ok(message_id.to_string())
    }

    async fn patch_message(&self, message_id: &str, content: &str) -> LarkResult<()> {
        let token = self.access_token().await?;
        let card = markdown_card(content).to_string();

        let response: ApiResponse = self
            .http
            .patch(self.url(&format!("/open-apis/im/v1/messages/{}", message_id)))
            .bearer_auth(token)
            .timeout(PATCH_TIMEOUT)
            .json(&json!({ "content": card }))
            .send()
            .await?
            .json()
            .await?;

        response.into_ok()?;
        debug!(message_id, "patched message");
        Ok(())
    }

    async fn bot_open_id(&self) -> LarkResult<String> {
        let token = self.access_token().await?;

        let response: ApiResponse = self
            .http
            .get(self.url("/open-apis/bot/v3/info"))
            .bearer_auth(token)
            .timeout(TOKEN_TIMEOUT)
            .send()
            .await?
            .json()
            .await?;

        let response = response.into_ok()?;
        response
            .bot
            .get("open_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LarkError::InvalidResponse("bot info without open_id".to_string()))
    }
}
