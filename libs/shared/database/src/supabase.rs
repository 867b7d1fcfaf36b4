use anyhow::{Context, Result};
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Non-success response from PostgREST, kept typed so repositories can
/// tell a missing row or a constraint violation from a transport failure.
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),
}

impl SupabaseError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SupabaseError::Status { status, .. } => Some(*status),
            SupabaseError::InvalidHeader(_) => None,
        }
    }
}

/// Returns the HTTP status carried by an error produced by [`SupabaseClient`], if any.
pub fn error_status(err: &anyhow::Error) -> Option<u16> {
    err.downcast_ref::<SupabaseError>().and_then(SupabaseError::status)
}

pub fn is_conflict(err: &anyhow::Error) -> bool {
    error_status(err) == Some(StatusCode::CONFLICT.as_u16())
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_base_url(&config.supabase_url, &config.supabase_anon_key)
    }

    pub fn with_base_url(base_url: &str, anon_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, SupabaseError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key).map_err(|_| SupabaseError::InvalidHeader("apikey"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        // Writes echo the affected rows so callers can detect zero-row updates.
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let bearer = auth_token.unwrap_or(&self.anon_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bearer))
                .map_err(|_| SupabaseError::InvalidHeader("authorization"))?,
        );

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let headers = self.get_headers(auth_token)?;

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            return Err(SupabaseError::Status {
                status: status.as_u16(),
                body: error_text,
            }.into());
        }

        let data = response.json::<T>().await
            .with_context(|| format!("Failed to decode response from {}", url))?;
        Ok(data)
    }

    /// GET a filtered table path and deserialize every row.
    pub async fn select<T>(&self, path: &str) -> Result<Vec<T>>
    where T: DeserializeOwned {
        self.request::<Vec<T>>(Method::GET, path, None, None).await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
