use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{config::Settings, errors::AppError};

use super::token_manager::TokenManager;

/// Thin authenticated GET client for the broker REST API.
#[derive(Clone)]
pub struct BrokerClient {
    http: Client,
    base_url: String,
    tokens: Arc<TokenManager>,
}

impl BrokerClient {
    pub fn new(settings: &Settings, tokens: Arc<TokenManager>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.upstream_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            base_url: settings.broker_api_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub async fn get_json(&self, endpoint: &str) -> Result<Value, AppError> {
        let token = self.tokens.get_valid_token().await?;

        let url = format!("{}{}", self.base_url, endpoint);
        let res = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("oauth_token", token.as_str())])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            return Err(AppError::Upstream(format!("API call failed: {status}")));
        }

        Ok(res.json::<Value>().await?)
    }

    pub async fn profile(&self) -> Result<Value, AppError> {
        self.get_json("/connect/profile").await
    }

    pub async fn trading_accounts(&self) -> Result<Value, AppError> {
        self.get_json("/connect/tradingaccounts").await
    }

    pub async fn account_balance(&self, account_id: &str) -> Result<BalanceView, AppError> {
        let accounts = self.trading_accounts().await?;
        BalanceView::find(&accounts, account_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceView {
    pub account_id: Value,
    pub account_number: Value,
    pub balance: f64,
    pub currency: Value,
    pub leverage: Value,
    pub account_type: String,
    pub status: Value,
    pub last_update: String,
}

impl BalanceView {
    /// Picks `account_id` out of a `/connect/tradingaccounts` response and
    /// scales the raw balance by `10^moneyDigits`.
    pub fn find(accounts: &Value, account_id: &str) -> Result<Self, AppError> {
        let account = accounts
            .get("data")
            .and_then(Value::as_array)
            .and_then(|list| {
                list.iter().find(|acc| match acc.get("accountId") {
                    Some(Value::String(s)) => s == account_id,
                    Some(Value::Number(n)) => n.to_string() == account_id,
                    _ => false,
                })
            })
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

        let field = |name: &str| account.get(name).cloned().unwrap_or(Value::Null);

        let raw = account.get("balance").and_then(Value::as_f64).unwrap_or(0.0);
        let digits = account.get("moneyDigits").and_then(Value::as_i64).unwrap_or(0);
        let live = account.get("live").and_then(Value::as_bool).unwrap_or(false);

        Ok(Self {
            account_id: field("accountId"),
            account_number: field("accountNumber"),
            balance: raw / 10f64.powi(digits as i32),
            currency: field("depositCurrency"),
            leverage: field("leverage"),
            account_type: if live { "LIVE" } else { "DEMO" }.to_string(),
            status: field("accountStatus"),
            last_update: Utc::now().to_rfc3339(),
        })
    }
}
