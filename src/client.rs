use crate::error::RatesError;
use crate::models::DateKey;
use log::{debug, info};
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;
use std::future::Future;

/// Endpoint the date string is appended to.
pub const BASE_URL: &str = "https://api.privatbank.ua/p24api/exchange_rates?json&date=";

/// Anything able to return the raw exchange-rate document for one day.
pub trait RateSource: Send + Sync + 'static {
    fn fetch_day(&self, date: DateKey) -> impl Future<Output = Result<Value, RatesError>> + Send;
}

#[derive(Debug, Clone)]
pub struct Client {
    http: HttpClient,
    base_url: String,
}

impl Client {
    /// Create a new client with the default base URL.
    pub fn new() -> Result<Self, RatesError> {
        let http = HttpClient::builder().build()?;

        info!("Initialized PrivatBank API client with default base URL");
        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Override the base URL (useful for tests or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        info!("Updated PrivatBank API base URL to {}", self.base_url);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the archived exchange rates published for `date`.
    pub async fn fetch_exchange_rates(&self, date: DateKey) -> Result<Value, RatesError> {
        let url = format!("{}{}", self.base_url, date);
        debug!("GET request to {}", url);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        debug!("Received status {} for {}", status, date);
        if status != StatusCode::OK {
            return Err(RatesError::Http { status });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|_| RatesError::InvalidResponse)
    }
}

impl RateSource for Client {
    async fn fetch_day(&self, date: DateKey) -> Result<Value, RatesError> {
        self.fetch_exchange_rates(date).await
    }
}
