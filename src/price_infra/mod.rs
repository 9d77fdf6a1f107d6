pub mod hardcoded;
pub mod coingecko;

pub use coingecko::CoinGeckoResolver;
pub use hardcoded::HardcodedResolver;
