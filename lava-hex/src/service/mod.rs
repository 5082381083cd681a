//! Gateway Application Services
//!
//! Orchestrates the two entry points through the billing and provider
//! ports. Contains NO infrastructure logic.
//!
//! - `link` - creates provider invoices and renders the pay button
//! - `webhook` - validates notifications and applies payments once

mod link;
mod webhook;

pub use link::{LinkGenerator, interpret_reply};
pub use webhook::{WebhookOutcome, WebhookProcessor};

/// Route the provider posts notifications to.
pub const CALLBACK_PATH: &str = "/callback/lava";

/// Webhook URL handed to the provider for a billing system base URL.
pub fn hook_url(system_url: &str) -> String {
    format!("{}{}", system_url.trim_end_matches('/'), CALLBACK_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_url() {
        assert_eq!(
            hook_url("https://billing.example.com/"),
            "https://billing.example.com/callback/lava"
        );
        assert_eq!(
            hook_url("https://billing.example.com"),
            "https://billing.example.com/callback/lava"
        );
    }
}
