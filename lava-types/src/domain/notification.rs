//! Inbound payment notifications.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::order::OrderId;

/// Statuses that mean the payment went through.
pub const SUCCESS_STATUSES: [&str; 3] = ["success", "paid", "completed"];

/// A decoded webhook body.
///
/// Every field is optional: an absent or oddly-typed field becomes `None`
/// and the required-field check happens afterwards. Numbers are kept as
/// their textual form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentNotification {
    /// Provider-assigned invoice UUID
    #[serde(default, deserialize_with = "lenient_string")]
    pub invoice_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub credited: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pay_time: Option<String>,
}

impl PaymentNotification {
    /// Extracts the known fields from a decoded body.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Order id, when present and not blank.
    pub fn order_id(&self) -> Option<OrderId> {
        non_blank(self.order_id.as_deref()).map(OrderId::from)
    }

    pub fn status(&self) -> Option<&str> {
        non_blank(self.status.as_deref())
    }

    /// Provider invoice UUID, when present and not blank.
    pub fn provider_id(&self) -> Option<&str> {
        non_blank(self.invoice_id.as_deref())
    }

    /// True when the status reports a completed payment.
    pub fn is_success(&self) -> bool {
        self.status()
            .map(|s| SUCCESS_STATUSES.iter().any(|ok| s.eq_ignore_ascii_case(ok)))
            .unwrap_or(false)
    }
}

/// `""` and `"0"` count as blank, matching the host platform's notion of empty.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != "0")
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(if b { "1".into() } else { String::new() }),
        _ => None,
    })
}
