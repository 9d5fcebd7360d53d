// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Tuya Tray Contributors

// Tuya cloud client
//
// The client owns the credential pair and a cached access token. It is an
// immutable value; a config change constructs a new client instead of
// mutating a shared one.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::config::TuyaConfig;
use crate::error::{Error, Result};
use crate::sign;
use crate::types::{ApiResponse, CommandRequest, Device, DeviceCommand, StatusItem, TokenGrant};

/// Request timeout for all cloud calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Renew the cached token this long before it expires
const TOKEN_RENEWAL_MARGIN_SECS: i64 = 60;

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

pub struct CloudClient {
    http: Client,
    base_url: String,
    access_key: String,
    secret_key: String,
    token: Mutex<Option<CachedToken>>,
}

impl CloudClient {
    /// Build a client from a complete config. Incomplete credentials are a
    /// configuration error.
    pub fn new(config: &TuyaConfig) -> Result<Self> {
        if !config.is_complete() {
            return Err(Error::Config(
                "all four credential fields must be set".to_string(),
            ));
        }

        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            token: Mutex::new(None),
        })
    }

    /// List the devices registered to the given cloud user
    pub async fn list_devices(&self, user_id: &str) -> Result<Vec<Device>> {
        let path = format!("/v1.0/users/{}/devices", user_id);
        self.request(Method::GET, &path, None).await
    }

    /// Fetch the current status data points of a device
    pub async fn device_status(&self, device_id: &str) -> Result<Vec<StatusItem>> {
        let path = format!("/v1.0/devices/{}/status", device_id);
        self.request(Method::GET, &path, None).await
    }

    /// Send a single command to a device
    pub async fn send_command(&self, device_id: &str, code: &str, value: Value) -> Result<()> {
        let path = format!("/v1.0/devices/{}/commands", device_id);
        let body = CommandRequest {
            commands: vec![DeviceCommand {
                code: code.to_string(),
                value,
            }],
        };

        let _: Value = self
            .request(Method::POST, &path, Some(serde_json::to_value(&body)?))
            .await?;
        Ok(())
    }

    /// Send the command that flips a boolean status code
    pub async fn toggle_switch(&self, device_id: &str, code: &str, current: bool) -> Result<()> {
        self.send_command(device_id, code, Value::Bool(!current))
            .await
    }

    /// Signed business request; obtains an access token first
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let token = self.access_token().await?;
        let envelope: ApiResponse<T> = self
            .send_signed(method, path_and_query, body, Some(&token))
            .await?;
        envelope.into_result()
    }

    /// Return a valid access token, fetching or renewing as needed
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            let renewal_margin = chrono::Duration::seconds(TOKEN_RENEWAL_MARGIN_SECS);
            if Utc::now() + renewal_margin < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let envelope: ApiResponse<TokenGrant> = self
            .send_signed(Method::GET, "/v1.0/token?grant_type=1", None, None)
            .await?;
        let grant = envelope.into_result().map_err(|e| match e {
            Error::Api { code, msg } => {
                Error::Auth(format!("token request rejected ({}): {}", code, msg))
            }
            other => other,
        })?;

        debug!("Obtained access token, valid for {}s", grant.expire_time);

        *cached = Some(CachedToken {
            access_token: grant.access_token.clone(),
            expires_at: Utc::now() + chrono::Duration::seconds(grant.expire_time),
        });
        Ok(grant.access_token)
    }

    /// Sign and send one request; the signed bytes are the bytes sent
    async fn send_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Value>,
        access_token: Option<&str>,
    ) -> Result<ApiResponse<T>> {
        let body_bytes = match &body {
            Some(value) => serde_json::to_vec(value)?,
            None => Vec::new(),
        };

        let t = Utc::now().timestamp_millis().to_string();
        let nonce = Uuid::new_v4().simple().to_string();
        let canonical = sign::string_to_sign(method.as_str(), &body_bytes, path_and_query);
        let signature = sign::sign(
            &self.secret_key,
            &self.access_key,
            access_token.unwrap_or(""),
            &t,
            &nonce,
            &canonical,
        );

        let url = format!("{}{}", self.base_url, path_and_query);
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, url)
            .header("client_id", &self.access_key)
            .header("sign", signature)
            .header("sign_method", "HMAC-SHA256")
            .header("t", t)
            .header("nonce", nonce);

        if let Some(token) = access_token {
            request = request.header("access_token", token);
        }
        if !body_bytes.is_empty() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body_bytes);
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}
