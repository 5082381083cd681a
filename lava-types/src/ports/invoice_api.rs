//! Provider API port.
//!
//! Implemented by the HTTP client for the Lava business API and by stubs
//! in tests.

use crate::error::LinkError;

/// Outbound invoice-creation call.
#[async_trait::async_trait]
pub trait InvoiceApi: Send + Sync + 'static {
    /// Sends an already signed body and returns the decoded JSON reply.
    ///
    /// Transport failures and undecodable replies are `LinkError::Transport`;
    /// interpreting the reply is left to the caller.
    async fn create_invoice(
        &self,
        signed_body: &serde_json::Value,
    ) -> Result<serde_json::Value, LinkError>;
}
