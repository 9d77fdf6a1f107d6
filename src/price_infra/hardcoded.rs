use std::collections::HashMap;
use async_trait::async_trait;
use crate::error::{Error, Result};
use crate::interfaces::PriceResolver;

/// Fixed USD rate table, keyed by upper-case symbol.
pub struct HardcodedResolver {
    rates: HashMap<String, f64>,
}

impl HardcodedResolver {
    pub fn new() -> Self {
        Self::with_rates([
            ("SFL", 0.05649),
            ("MATIC", 0.3264),
            ("USDC", 1.0),
            ("USDC.E", 1.0),
        ])
    }

    pub fn with_rates<'a>(rates: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        HardcodedResolver {
            rates: rates
                .into_iter()
                .map(|(symbol, rate)| (symbol.to_uppercase(), rate))
                .collect(),
        }
    }
}

impl Default for HardcodedResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceResolver for HardcodedResolver {
    async fn convert_to_usd(&self, amount: f64, symbol: &str) -> Result<f64> {
        let rate = self.rates
            .get(&symbol.to_uppercase())
            .ok_or_else(|| Error::UnknownCurrency(symbol.to_string()))?;

        Ok(amount * rate)
    }
}
