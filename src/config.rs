use std::env;

use chrono::Duration;

/// Longest lifetime accepted for an access token, from env or the broker.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400 * 365;

// a freshness window longer than a day is treated as a day
const MAX_FRESHNESS_WINDOW_SECS: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_expires_in: i64,

    pub broker_api_url: String,
    pub token_url: String,
    pub upstream_timeout_secs: u64,

    // shared secret the cBot sends with every push
    pub cbot_auth_token: String,

    pub max_positions: usize,
    pub max_trades: usize,
    pub max_stress_events: usize,
    pub freshness_window_secs: i64,
}

impl Settings {
    pub fn has_credentials(&self) -> bool {
        !self.client_id.trim().is_empty()
            && !self.client_secret.trim().is_empty()
            && !self.access_token.trim().is_empty()
    }

    /// `FRESHNESS_WINDOW_SECS` clamped to `0..=1 day`.
    pub fn freshness_window(&self) -> Duration {
        let secs = self.freshness_window_secs.clamp(0, MAX_FRESHNESS_WINDOW_SECS);
        Duration::try_seconds(secs).unwrap_or_else(Duration::zero)
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    Settings {
        host: var_or("HOST", "0.0.0.0"),
        port: parsed_or("PORT", 3000),

        client_id: var_or("CLIENT_ID", ""),
        client_secret: var_or("CLIENT_SECRET", ""),
        access_token: var_or("ACCESS_TOKEN", ""),
        refresh_token: var_or("REFRESH_TOKEN", ""),
        token_expires_in: parsed_or("TOKEN_EXPIRES_IN", 3600),

        broker_api_url: var_or("BROKER_API_URL", "https://api.spotware.com"),
        token_url: var_or("TOKEN_URL", "https://openapi.ctrader.com/apps/token"),
        upstream_timeout_secs: parsed_or("UPSTREAM_TIMEOUT_SECS", 10),

        cbot_auth_token: var_or("CBOT_AUTH_TOKEN", "CitadelAI_Bridge_Token_2025"),

        max_positions: parsed_or("MAX_POSITIONS", 1000),
        max_trades: parsed_or("MAX_TRADES", 5000),
        max_stress_events: parsed_or("MAX_STRESS_EVENTS", 500),
        freshness_window_secs: parsed_or("FRESHNESS_WINDOW_SECS", 300),
    }
}
