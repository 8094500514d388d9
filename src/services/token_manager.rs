use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    config::{Settings, MAX_TOKEN_LIFETIME_SECS},
    errors::AppError,
};

// refresh this long before the token actually expires
const REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// `from + secs`, with `secs` clamped to `0..=MAX_TOKEN_LIFETIME_SECS`.
/// `None` only when the sum leaves chrono's range.
fn expiry_after(from: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    let lifetime = Duration::try_seconds(secs.clamp(0, MAX_TOKEN_LIFETIME_SECS))?;
    from.checked_add_signed(lifetime)
}

#[derive(Debug, Clone)]
struct TokenCache {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// OAuth tokens for the broker API.
pub struct TokenManager {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cache: Mutex<TokenCache>,
}

impl TokenManager {
    pub fn new(settings: &Settings) -> Self {
        let now = Utc::now();
        // out of range: treat as already expired so the first call refreshes
        let expires_at = expiry_after(now, settings.token_expires_in).unwrap_or(now);

        let http = Client::builder()
            .timeout(StdDuration::from_secs(settings.upstream_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            token_url: settings.token_url.clone(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            cache: Mutex::new(TokenCache {
                access_token: settings.access_token.clone(),
                refresh_token: settings.refresh_token.clone(),
                expires_at,
            }),
        }
    }

    pub async fn expires_at(&self) -> DateTime<Utc> {
        self.cache.lock().await.expires_at
    }

    /// Current access token, refreshed first when it expires within five
    /// minutes. Callers queue on the cache lock, so one refresh serves all.
    pub async fn get_valid_token(&self) -> Result<String, AppError> {
        let mut cache = self.cache.lock().await;

        if Utc::now() + Duration::seconds(REFRESH_MARGIN_SECS) >= cache.expires_at {
            tracing::info!("access token expiring soon, refreshing");
            self.refresh(&mut cache).await?;
        }

        Ok(cache.access_token.clone())
    }

    async fn refresh(&self, cache: &mut TokenCache) -> Result<(), AppError> {
        let res = self
            .http
            .get(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", cache.refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("token refresh error: {e}");
                AppError::Upstream("Unable to refresh token".to_string())
            })?;

        let body: RefreshResponse = res.json().await.map_err(|e| {
            tracing::error!("token refresh returned an unreadable body: {e}");
            AppError::Upstream("Unable to refresh token".to_string())
        })?;

        let Some(access_token) = body.access_token else {
            tracing::error!("token refresh failed: response carried no accessToken");
            return Err(AppError::Upstream("Unable to refresh token".to_string()));
        };

        let Some(expires_at) = expiry_after(Utc::now(), body.expires_in.unwrap_or(3600)) else {
            tracing::error!(expires_in = ?body.expires_in, "token refresh returned an unusable expiresIn");
            return Err(AppError::Upstream("Unable to refresh token".to_string()));
        };

        cache.access_token = access_token;
        if let Some(refresh_token) = body.refresh_token {
            cache.refresh_token = refresh_token;
        }
        cache.expires_at = expires_at;

        tracing::info!(expires_at = %cache.expires_at, "token refreshed");
        Ok(())
    }
}
