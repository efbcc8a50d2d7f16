//! Currency conversion anchored on USD quotes.

pub mod service;

use async_trait::async_trait;

use crate::error::{PayrollError, Result};

pub use service::CurrencyService;

#[async_trait]
pub trait CurrencyConverter: Send + Sync {
    /// Units of `code` per one USD.
    async fn get_rate(&self, code: &str) -> Result<f64>;

    /// Converts `value` from `src` to `dst`, rounding up. Returns the converted
    /// amount and the rate applied.
    async fn convert(&self, value: f64, src: &str, dst: &str) -> Result<(f64, f64)> {
        if src.eq_ignore_ascii_case(dst) {
            return Ok((value.ceil(), 1.0));
        }
        let x = self.get_rate(src).await?;
        let y = self.get_rate(dst).await?;
        if x == 0.0 {
            return Err(PayrollError::Currency(format!("zero rate for {src}")));
        }
        Ok(((value * y / x).ceil(), y / x))
    }
}
