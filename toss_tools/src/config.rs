use std::time::Duration;

use log::*;
use market_common::Secret;

const DEFAULT_TOSS_BASE_URL: &str = "https://api.tosspayments.com/v1/payments/";
const DEFAULT_TOSS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TossConfig {
    /// The payments endpoint. Payment keys are appended to it directly, so it must end with a `/`.
    pub base_url: String,
    pub secret_key: Secret<String>,
    /// Upper bound for a whole request/response round trip.
    pub timeout: Duration,
}

impl Default for TossConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TOSS_BASE_URL.to_string(),
            secret_key: Secret::default(),
            timeout: DEFAULT_TOSS_TIMEOUT,
        }
    }
}

impl TossConfig {
    pub fn new(base_url: &str, secret_key: &str) -> Self {
        Self { base_url: base_url.to_string(), secret_key: Secret::new(secret_key.to_string()), ..Default::default() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("MPG_TOSS_BASE_URL").unwrap_or_else(|_| {
            info!("🪛️ MPG_TOSS_BASE_URL not set, using {DEFAULT_TOSS_BASE_URL}");
            DEFAULT_TOSS_BASE_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("MPG_TOSS_SECRET_KEY").unwrap_or_else(|_| {
            warn!("🪛️ MPG_TOSS_SECRET_KEY not set, using (probably useless) default");
            "test_sk_00000000000000000000".to_string()
        }));
        let timeout = std::env::var("MPG_TOSS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ {s} is not a valid value for MPG_TOSS_TIMEOUT_SECS. {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOSS_TIMEOUT);
        Self { base_url, secret_key, timeout }
    }
}
