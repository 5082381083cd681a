//! Lava CLI
//!
//! Operator tools for the Lava.ru gateway: create a payment link against
//! the provider, sign or verify payloads, replay webhooks, seed test invoices.

use std::io::Read;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use lava_client::{LavaClient, WebhookSender};
use lava_hex::LinkGenerator;
use lava_repo::{build_repo, security};
use lava_types::{
    Currency, GatewayConfig, GatewayCredentials, InvoiceId, Money, PaymentLinkRequest,
};

#[derive(Parser)]
#[command(name = "lava")]
#[command(author, version, about = "Lava.ru gateway operator CLI", long_about = None)]
struct Cli {
    /// Billing store: a SQLite URL, or `memory`
    #[arg(long, env = "DATABASE_URL", default_value = "memory")]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a provider invoice and print the payment URL
    Link {
        /// Billing invoice id
        #[arg(long)]
        invoice: i64,
        /// Amount in major units, e.g. 1500.00
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "Test payment")]
        description: String,
        #[arg(long, env = "SYSTEM_URL", default_value = "http://localhost:3000")]
        system_url: String,
        /// Where the payer returns to; defaults to the billing system URL
        #[arg(long)]
        return_url: Option<String>,
        #[arg(long, env = "LAVA_SHOP_ID")]
        shop_id: String,
        #[arg(long, env = "LAVA_SECRET_KEY", hide_env_values = true)]
        secret_key: String,
        #[arg(long, env = "LAVA_EXPIRE_MINUTES", default_value_t = 60)]
        expire_minutes: u32,
        #[arg(long, env = "LAVA_API_URL", default_value = lava_client::DEFAULT_BASE_URL)]
        api_url: String,
    },
    /// Print the signature of a JSON object (file path, or `-` for stdin)
    Sign {
        #[arg(default_value = "-")]
        input: String,
        /// Signing key; the webhook key for notifications, the secret key for API calls
        #[arg(long, env = "LAVA_WEBHOOK_KEY", hide_env_values = true)]
        key: String,
        /// Print the signed object instead of the bare signature
        #[arg(long, conflicts_with = "verify")]
        attach: bool,
        /// Check this signature against the input instead of printing one
        #[arg(long)]
        verify: Option<String>,
    },
    /// Send a provider-style payment notification to a receiver
    SendWebhook {
        /// Order id the notification refers to, e.g. `482_abc`
        #[arg(long)]
        order_id: String,
        #[arg(long, default_value = "success")]
        status: String,
        #[arg(long, default_value_t = 0.0)]
        amount: f64,
        #[arg(long, default_value = "http://localhost:3000/callback/lava")]
        url: String,
        /// Signs the body into the Authorization header when set
        #[arg(long, env = "LAVA_WEBHOOK_KEY", hide_env_values = true)]
        key: Option<String>,
    },
    /// Insert an unpaid invoice into the billing store
    SeedInvoice {
        #[arg(long)]
        id: i64,
        /// Total in major units, e.g. 1500.00
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "RUB")]
        currency: String,
    },
}

/// Converts a major-unit amount to minor units for `currency`.
fn to_minor(amount: f64, currency: Currency) -> Result<Money> {
    let scale = 10f64.powi(currency.decimal_places() as i32);
    Ok(Money::new((amount * scale).round() as i64, currency)?)
}

fn read_json(input: &str) -> Result<Value> {
    let mut raw = String::new();
    if input == "-" {
        std::io::stdin().read_to_string(&mut raw)?;
    } else {
        raw = std::fs::read_to_string(input)?;
    }
    let value: Value = serde_json::from_str(&raw)?;
    if !value.is_object() {
        anyhow::bail!("Expected a JSON object");
    }
    Ok(value)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Link {
            invoice,
            amount,
            description,
            system_url,
            return_url,
            shop_id,
            secret_key,
            expire_minutes,
            api_url,
        } => {
            let credentials = GatewayCredentials {
                shop_id,
                secret_key,
                webhook_key: None,
                expire_minutes,
            };
            let config = Arc::new(GatewayConfig::new(credentials, system_url.clone()));
            let repo = Arc::new(build_repo(&cli.database_url).await?);
            let links = LinkGenerator::new(config, repo, LavaClient::with_base_url(api_url)?);

            let req = PaymentLinkRequest {
                invoice_id: InvoiceId::new(invoice),
                description,
                amount,
                return_url: return_url.unwrap_or(system_url),
                system_url: None,
                label: "Pay Now".into(),
            };
            match links.create_link(&req).await {
                Ok(url) => println!("{}", url),
                Err(e) => {
                    eprintln!("✗ {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Sign {
            input,
            key,
            attach,
            verify,
        } => {
            let value = read_json(&input)?;
            if let Some(signature) = verify {
                if security::verify_payload(&value, &signature, &key) {
                    println!("✓ Signature valid");
                } else {
                    eprintln!("✗ Signature mismatch");
                    std::process::exit(1);
                }
            } else if attach {
                let signed = security::sign_request(value, &key)?;
                println!("{}", serde_json::to_string_pretty(&signed)?);
            } else {
                println!("{}", security::sign_payload(&value, &key)?);
            }
        }

        Commands::SendWebhook {
            order_id,
            status,
            amount,
            url,
            key,
        } => {
            let body = json!({
                "invoice_id": uuid::Uuid::new_v4().to_string(),
                "order_id": order_id,
                "status": status,
                "amount": amount,
                "credited": amount,
                "pay_time": chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            });
            let signature = match key.as_deref().filter(|k| !k.is_empty()) {
                Some(key) => Some(security::sign_payload(&body, key)?),
                None => None,
            };

            let sender = WebhookSender::new()?;
            let (code, reply) = sender.send(&url, &body, signature.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            println!("→ {} {}", code, reply);
            if !(200..300).contains(&code) {
                std::process::exit(1);
            }
        }

        Commands::SeedInvoice {
            id,
            amount,
            currency,
        } => {
            let currency: Currency = currency.parse()?;
            let total = to_minor(amount, currency)?;
            let repo = build_repo(&cli.database_url).await?;
            let invoice = repo.create_invoice(InvoiceId::new(id), total).await?;
            println!("{}", serde_json::to_string_pretty(&invoice)?);
            println!("✓ Invoice {} created for {}", invoice.id, total);
        }
    }

    Ok(())
}
