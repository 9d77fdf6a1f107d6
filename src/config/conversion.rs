use serde::Deserialize;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversionKind {
    Hardcoded,
    Coingecko,
}

/// CoinGecko plan the API key belongs to. The plan picks both the base URL
/// and the header carrying the key.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyType {
    Demo,
    Pro,
}

impl ApiKeyType {
    pub fn header_name(&self) -> &'static str {
        match self {
            ApiKeyType::Demo => "x_cg_demo_api_key",
            ApiKeyType::Pro => "x-cg-pro-api-key",
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            ApiKeyType::Demo => "https://api.coingecko.com/api/v3/",
            ApiKeyType::Pro => "https://pro-api.coingecko.com/api/v3/",
        }
    }
}

impl std::str::FromStr for ApiKeyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "demo" | "x_cg_demo_api_key" => Ok(ApiKeyType::Demo),
            "pro" | "x-cg-pro-api-key" => Ok(ApiKeyType::Pro),
            other => Err(format!("invalid conversor API key type {}", other)),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CoinGeckoConfig {
    pub key_type: ApiKeyType,
    pub key: String,
    /// Overrides the plan's base URL.
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl CoinGeckoConfig {
    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or_else(|| self.key_type.base_url())
    }
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        CoinGeckoConfig {
            key_type: ApiKeyType::Demo,
            key: String::new(),
            base_url: None,
            timeout_secs: Some(10),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub kind: ConversionKind,
    pub coingecko: CoinGeckoConfig,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            kind: ConversionKind::Hardcoded,
            coingecko: CoinGeckoConfig::default(),
        }
    }
}
