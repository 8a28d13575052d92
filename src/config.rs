use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Top-level configuration, loaded once at startup and passed explicitly to
/// both services. API keys and webhook URLs never live in globals.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub website: WebsiteConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebsiteConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_website_port")]
    pub port: u16,

    /// Base URL external services use to reach the webhook endpoints.
    /// Usually a tunnel or reverse-proxy address in front of `host:port`.
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// Where the dispatcher posts new tasks.
    #[serde(default = "default_agent_endpoint")]
    pub agent_endpoint: String,

    /// Shared secret for webhook callbacks. Empty disables verification;
    /// the webhook boundary is then trusted-network-only.
    #[serde(default)]
    pub webhook_secret: String,

    #[serde(default = "default_db_path")]
    pub db_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_relay_port")]
    pub port: u16,

    /// Must match the website's `webhook_secret` when that one is set.
    #[serde(default)]
    pub webhook_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_website_port() -> u16 {
    8000
}
fn default_relay_port() -> u16 {
    8080
}
fn default_agent_endpoint() -> String {
    "http://127.0.0.1:8080/agent/process".to_string()
}
fn default_db_path() -> String {
    "fyssa.db".to_string()
}
fn default_llm_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_website_port(),
            public_base_url: None,
            agent_endpoint: default_agent_endpoint(),
            webhook_secret: String::new(),
            db_path: default_db_path(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_relay_port(),
            webhook_secret: String::new(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: String::new(),
        }
    }
}

impl WebsiteConfig {
    /// Base URL handed to the relay for callbacks.
    pub fn callback_base_url(&self) -> String {
        match &self.public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config: Config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            toml::from_str(&raw)?
        } else {
            info!("No config file at {}, using defaults", path.display());
            Config::default()
        };

        if let Ok(key) = std::env::var("FYSSA_LLM_API_KEY") {
            config.llm.api_key = key;
        }

        Ok(config)
    }
}
