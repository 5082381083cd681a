//! Database row types and their conversion to domain types.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use lava_types::{Currency, GatewayLogEntry, Invoice, InvoiceId, Money, RepoError};

/// Invoice row from database.
#[derive(FromRow)]
pub struct DbInvoice {
    pub id: i64,
    pub total: i64,
    pub currency: String,
    pub status: String,
    pub date_paid: Option<String>,
}

/// Gateway log row from database.
#[derive(FromRow)]
pub struct DbGatewayLog {
    pub gateway: String,
    pub data: String,
    pub result: String,
    pub created_at: String,
}

pub fn parse_time(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepoError::Database(format!("Invalid timestamp {}: {}", raw, e)))
}

impl TryFrom<DbInvoice> for Invoice {
    type Error = RepoError;

    fn try_from(row: DbInvoice) -> Result<Self, Self::Error> {
        let currency: Currency = row.currency.parse()?;
        Ok(Invoice {
            id: InvoiceId::new(row.id),
            total: Money::new(row.total, currency)?,
            status: row.status.parse()?,
            date_paid: row.date_paid.as_deref().map(parse_time).transpose()?,
        })
    }
}

impl TryFrom<DbGatewayLog> for GatewayLogEntry {
    type Error = RepoError;

    fn try_from(row: DbGatewayLog) -> Result<Self, Self::Error> {
        Ok(GatewayLogEntry {
            gateway: row.gateway,
            data: serde_json::from_str(&row.data)
                .map_err(|e| RepoError::Database(e.to_string()))?,
            result: row.result,
            created_at: parse_time(&row.created_at)?,
        })
    }
}
