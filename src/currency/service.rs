use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use once_cell::sync::Lazy;
use serde::Deserialize;

use super::CurrencyConverter;
use crate::error::{PayrollError, Result};

const LIVE_ENDPOINT: &str = "http://apilayer.net/api/live";
const QUOTED: &str = "USD,CAD,GBP,EUR,VND";

/// Rates used outside production so that previews don't spend API quota.
static FIXED_RATES: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        ("USD", 1.0),
        ("CAD", 1.34275),
        ("GBP", 0.79185),
        ("EUR", 0.89795),
        ("VND", 25900.0),
    ])
});

#[derive(Deserialize)]
struct LiveResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    quotes: HashMap<String, f64>,
}

pub struct CurrencyService {
    client: reqwest::Client,
    api_key: String,
    production: bool,
    rates: Cache<String, f64>,
}

impl CurrencyService {
    pub fn new(api_key: impl Into<String>, production: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            production,
            rates: Cache::builder()
                .max_capacity(64)
                .time_to_live(Duration::from_secs(24 * 60 * 60))
                .build(),
        }
    }

    pub fn fixed(code: &str) -> Option<f64> {
        FIXED_RATES.get(code).copied()
    }

    /// Pulls every quoted currency at once and caches each of them.
    async fn fetch_live(&self) -> Result<()> {
        let resp: LiveResponse = self
            .client
            .get(LIVE_ENDPOINT)
            .query(&[("currencies", QUOTED), ("access_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| PayrollError::Currency(e.to_string()))?
            .json()
            .await
            .map_err(|e| PayrollError::Currency(e.to_string()))?;

        if !resp.success {
            return Err(PayrollError::Currency("rate provider rejected the request".into()));
        }

        for (pair, rate) in resp.quotes {
            if let Some(code) = pair.strip_prefix("USD") {
                let code = if code.is_empty() { "USD" } else { code };
                self.rates.insert(code.to_string(), rate).await;
            }
        }
        tracing::info!("currency rates refreshed");
        Ok(())
    }
}

#[async_trait]
impl CurrencyConverter for CurrencyService {
    async fn get_rate(&self, code: &str) -> Result<f64> {
        let code = code.trim().to_uppercase();
        if let Some(rate) = self.rates.get(&code).await.filter(|r| *r != 0.0) {
            return Ok(rate);
        }

        if !self.production {
            return Self::fixed(&code)
                .ok_or_else(|| PayrollError::Currency(format!("no fixed rate for {code}")));
        }

        self.fetch_live().await?;
        self.rates
            .get(&code)
            .await
            .filter(|r| *r != 0.0)
            .ok_or_else(|| PayrollError::Currency(format!("no live rate for {code}")))
    }
}
