use std::collections::HashMap;
use std::time::Duration;
use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::config::{ApiKeyType, CoinGeckoConfig};
use crate::error::{Error, Result};
use crate::interfaces::PriceResolver;

/// Map a currency symbol (lower case) to its CoinGecko coin id.
pub fn coin_id(symbol: &str) -> Option<&'static str> {
    match symbol {
        "sfl" => Some("sunflower-land"),
        "matic" => Some("matic-network"),
        "usdc" => Some("usd-coin"),
        "usdc.e" => Some("bridged-usdc-polygon-pos-bridge"),
        _ => None,
    }
}

/// Price resolver backed by the CoinGecko `simple/price` endpoint.
///
/// Rates are fetched once per symbol and cached for the lifetime of the
/// resolver. There is no eviction.
pub struct CoinGeckoResolver {
    client: reqwest::Client,
    base_url: String,
    key_type: ApiKeyType,
    key: String,
    rates: RwLock<HashMap<String, f64>>,
}

impl CoinGeckoResolver {
    pub fn new(config: &CoinGeckoConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| Error::ConfigError(format!("creating CoinGecko client: {}", e)))?;

        Ok(CoinGeckoResolver {
            client,
            base_url: config.effective_base_url().trim_end_matches('/').to_string(),
            key_type: config.key_type,
            key: config.key.clone(),
            rates: RwLock::new(HashMap::new()),
        })
    }

    fn price_url(&self, id: &str) -> String {
        format!("{}/simple/price?ids={}&vs_currencies=usd", self.base_url, id)
    }

    async fn fetch_price(&self, symbol: &str, id: &str) -> Result<f64> {
        let url = self.price_url(id);
        tracing::debug!(symbol, url = %url, "Requesting price");

        let response = self.client
            .get(&url)
            .header("Accept", "application/json")
            .header(self.key_type.header_name(), &self.key)
            .send()
            .await
            .map_err(|e| Error::PriceApi(format!("doing request: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::PriceApi(format!("reading body: {}", e)))?;

        if !status.is_success() {
            return Err(Error::PriceApi(format!(
                "unexpected status code: {}, body: {}",
                status.as_u16(),
                body
            )));
        }

        parse_price(&body, id)
    }
}

fn parse_price(body: &str, id: &str) -> Result<f64> {
    let prices: HashMap<String, HashMap<String, f64>> = serde_json::from_str(body)
        .map_err(|e| Error::PriceApi(format!("unmarshaling body: {}", e)))?;

    prices
        .get(id)
        .and_then(|quote| quote.get("usd"))
        .copied()
        .ok_or_else(|| Error::PriceApi(format!("currency not found: {}", id)))
}

#[async_trait]
impl PriceResolver for CoinGeckoResolver {
    async fn convert_to_usd(&self, amount: f64, symbol: &str) -> Result<f64> {
        let symbol = symbol.to_lowercase();

        if let Some(price) = self.rates.read().await.get(&symbol) {
            return Ok(amount * price);
        }

        let id = coin_id(&symbol).ok_or_else(|| Error::UnknownCurrency(symbol.clone()))?;
        let price = self.fetch_price(&symbol, id).await?;

        self.rates.write().await.insert(symbol.clone(), price);
        tracing::debug!(symbol = %symbol, price, "Cached price");

        Ok(amount * price)
    }
}
