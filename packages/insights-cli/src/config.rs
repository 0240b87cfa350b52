use anyhow::{Context, Result};
use dotenvy::dotenv;
use gsc_insights::InsightsConfig;
use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub access_token: String,
    pub pagespeed_api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub insights: InsightsConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            access_token: env::var("GSC_ACCESS_TOKEN")
                .context("GSC_ACCESS_TOKEN must be set")?,
            pagespeed_api_key: env::var("PAGESPEED_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            api_base_url: env::var("GSC_API_BASE_URL").ok(),
            insights: InsightsConfig::from_env().context("Invalid GSC_* tuning variable")?,
        })
    }
}
