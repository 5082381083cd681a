//! Configuration loading from environment.

use std::env;

use lava_types::{
    GatewayConfig, GatewayCredentials,
    domain::config::{DEFAULT_EXPIRE_MINUTES, MAX_EXPIRE_MINUTES},
};

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub api_url: String,
    pub gateway: GatewayConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()?;

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let system_url = var("SYSTEM_URL")
            .ok_or_else(|| anyhow::anyhow!("SYSTEM_URL environment variable is required"))?;

        let expire_minutes = match var("LAVA_EXPIRE_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|e| anyhow::anyhow!("LAVA_EXPIRE_MINUTES: {}", e))?
                .clamp(1, MAX_EXPIRE_MINUTES),
            None => DEFAULT_EXPIRE_MINUTES,
        };

        let credentials = GatewayCredentials {
            shop_id: var("LAVA_SHOP_ID").unwrap_or_default(),
            secret_key: var("LAVA_SECRET_KEY").unwrap_or_default(),
            webhook_key: var("LAVA_WEBHOOK_KEY").filter(|k| !k.is_empty()),
            expire_minutes,
        };

        let mut gateway = GatewayConfig::new(credentials, system_url);
        gateway.enabled = flag(var("LAVA_GATEWAY_ENABLED"), true);
        gateway.require_signature = flag(var("LAVA_REQUIRE_SIGNATURE"), false);

        let api_url = var("LAVA_API_URL").unwrap_or_else(|| lava_client::DEFAULT_BASE_URL.into());

        Ok(Self {
            port,
            database_url,
            api_url,
            gateway,
        })
    }
}

fn flag(value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(str::trim) {
        Some("1") | Some("true") | Some("on") | Some("yes") => true,
        Some("0") | Some("false") | Some("off") | Some("no") | Some("") => false,
        _ => default,
    }
}
