use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait PriceResolver: Send + Sync {
    /// Convert `amount` units of `symbol` to USD.
    ///
    /// Fails with `Error::UnknownCurrency` when the symbol cannot be priced.
    async fn convert_to_usd(&self, amount: f64, symbol: &str) -> Result<f64>;
}
