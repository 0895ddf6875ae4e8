use std::env;
use std::time::Duration;

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 6;
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Clone)]
pub struct ProviderRuntimeConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub temperature: f32,
}

impl std::fmt::Debug for ProviderRuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRuntimeConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl ProviderRuntimeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            temperature: 0.2,
        }
    }

    /// `None` when no API key is set, which keeps the whole service on the
    /// local heuristic.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let api_key = lookup("LABELSCAN_OPENAI_API_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())?;

        let mut config = Self::new(api_key);
        if let Some(model) = non_empty(lookup("LABELSCAN_OPENAI_MODEL")) {
            config.model = model;
        }
        if let Some(base_url) = non_empty(lookup("LABELSCAN_OPENAI_BASE_URL")) {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        config.connect_timeout = Duration::from_secs(
            lookup("LABELSCAN_PROVIDER_CONNECT_TIMEOUT_SECONDS")
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECONDS),
        );
        config.request_timeout = Duration::from_secs(
            lookup("LABELSCAN_PROVIDER_TIMEOUT_SECONDS")
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        );

        Some(config)
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
