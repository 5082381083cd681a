//! Gateway configuration, metadata, and the settings schema shown to
//! billing administrators.

use serde::Serialize;

/// Expiry used when none is configured.
pub const DEFAULT_EXPIRE_MINUTES: u32 = 60;

/// Longest invoice lifetime the provider accepts (5 days).
pub const MAX_EXPIRE_MINUTES: u32 = 7200;

/// Credentials issued by the provider for one shop.
#[derive(Clone, Default)]
pub struct GatewayCredentials {
    pub shop_id: String,
    /// Signs outbound API requests
    pub secret_key: String,
    /// Verifies inbound webhooks; verification is off when `None`
    pub webhook_key: Option<String>,
    pub expire_minutes: u32,
}

impl GatewayCredentials {
    /// True when both the shop id and the secret key are set.
    pub fn is_complete(&self) -> bool {
        !self.shop_id.trim().is_empty() && !self.secret_key.is_empty()
    }

    /// Configured expiry, falling back to the default and capped at the
    /// provider's maximum.
    pub fn expire_minutes(&self) -> u32 {
        match self.expire_minutes {
            0 => DEFAULT_EXPIRE_MINUTES,
            m => m.min(MAX_EXPIRE_MINUTES),
        }
    }

    pub fn webhook_key(&self) -> Option<&str> {
        self.webhook_key.as_deref().filter(|k| !k.is_empty())
    }
}

impl std::fmt::Debug for GatewayCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayCredentials")
            .field("shop_id", &self.shop_id)
            .field("secret_key", &"<redacted>")
            .field(
                "webhook_key",
                &self.webhook_key.as_ref().map(|_| "<redacted>"),
            )
            .field("expire_minutes", &self.expire_minutes)
            .finish()
    }
}

/// Immutable gateway configuration handed to both entry points.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway name used in billing logs and payment records
    pub name: String,
    /// Whether the billing administrator activated the gateway
    pub enabled: bool,
    pub credentials: GatewayCredentials,
    /// Reject webhooks without a signature header when a webhook key is set
    pub require_signature: bool,
    /// Public base URL of the billing system, used to build `hookUrl`
    pub system_url: String,
}

impl GatewayConfig {
    pub fn new(credentials: GatewayCredentials, system_url: impl Into<String>) -> Self {
        Self {
            name: GatewayMetadata::MODULE.to_string(),
            enabled: true,
            credentials,
            require_signature: false,
            system_url: system_url.into(),
        }
    }
}

/// Static description of the gateway module for the billing host.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GatewayMetadata {
    pub display_name: &'static str,
    #[serde(rename = "APIVersion")]
    pub api_version: &'static str,
    pub disable_local_credit_card_input: bool,
    pub tokenised_storage: bool,
}

impl GatewayMetadata {
    pub const MODULE: &'static str = "lava";
    pub const FRIENDLY_NAME: &'static str = "Lava.ru";

    pub fn get() -> Self {
        Self {
            display_name: "Lava.ru Payment Gateway",
            api_version: "1.1",
            disable_local_credit_card_input: true,
            tokenised_storage: false,
        }
    }
}

/// Input type of a configuration field in the admin form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Password,
}

/// One entry of the gateway settings form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigField {
    pub key: &'static str,
    pub friendly_name: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub size: u16,
    pub default: &'static str,
    pub description: &'static str,
}

/// The settings form: shop id, secret key, webhook key, expiry.
pub fn config_fields() -> Vec<ConfigField> {
    vec![
        ConfigField {
            key: "shopId",
            friendly_name: "Shop ID",
            field_type: FieldType::Text,
            size: 50,
            default: "",
            description: "Project UUID from the Lava.ru dashboard",
        },
        ConfigField {
            key: "secretKey",
            friendly_name: "Secret Key",
            field_type: FieldType::Password,
            size: 100,
            default: "",
            description: "Secret key used to sign API requests",
        },
        ConfigField {
            key: "webhookKey",
            friendly_name: "Webhook Key (Additional Key)",
            field_type: FieldType::Password,
            size: 100,
            default: "",
            description: "Additional key used to verify webhook signatures",
        },
        ConfigField {
            key: "expireMinutes",
            friendly_name: "Expire (minutes)",
            field_type: FieldType::Text,
            size: 10,
            default: "60",
            description: "Invoice lifetime in minutes (max 7200 = 5 days)",
        },
    ]
}
