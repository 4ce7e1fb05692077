//! Process configuration loaded from the environment

/// Default market data endpoint (Binance-compatible REST)
const DEFAULT_MARKET_BASE_URL: &str = "https://api.binance.com/api/v3";

/// Default insight gateway endpoint
const DEFAULT_INSIGHT_BASE_URL: &str = "http://localhost:8090";

/// Default generation model id
const DEFAULT_INSIGHT_MODEL: &str = "gemini-2.5-flash";

/// Configuration loaded once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the insight gateway. Required; its absence is a fatal
    /// configuration error, not something to retry.
    pub insight_api_key: String,
    pub insight_base_url: String,
    pub insight_model: String,
    pub market_base_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `INSIGHT_API_KEY` is required; the endpoint and model variables fall
    /// back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let insight_api_key = std::env::var("INSIGHT_API_KEY")
            .map_err(|_| anyhow::anyhow!("INSIGHT_API_KEY environment variable required"))?;

        if insight_api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("INSIGHT_API_KEY is set but empty"));
        }

        let insight_base_url = std::env::var("INSIGHT_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_INSIGHT_BASE_URL.to_string());

        let insight_model =
            std::env::var("INSIGHT_MODEL").unwrap_or_else(|_| DEFAULT_INSIGHT_MODEL.to_string());

        let market_base_url = std::env::var("MARKET_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_MARKET_BASE_URL.to_string());

        Ok(Self {
            insight_api_key,
            insight_base_url,
            insight_model,
            market_base_url,
        })
    }
}
