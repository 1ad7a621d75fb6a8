//! Paygate CLI
//!
//! Command-line interface for the Paygate API.

use anyhow::Result;
use clap::{Parser, Subcommand};

use paygate_client::PaygateClient;
use paygate_types::{AccountId, Card, Currency, PaymentId, UpdateAccountRequest};

#[derive(Parser)]
#[command(name = "paygate")]
#[command(author, version, about = "Paygate API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the Paygate API
    #[arg(long, env = "PAYGATE_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Merchant (payee) account ID for payment commands
    #[arg(long, env = "PAYGATE_MERCHANT_ID")]
    merchant: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account operations
    Account {
        #[command(subcommand)]
        action: AccountCommands,
    },
    /// Payment operations (require --merchant)
    Payment {
        #[command(subcommand)]
        action: PaymentCommands,
    },
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Create a new account with a freshly issued card
    Create {
        first_name: String,
        last_name: String,
        /// Currency (RUB, USD, EUR, GBP)
        #[arg(long, default_value = "RUB")]
        currency: String,
    },
    /// Get account details
    Get {
        /// Account ID (UUID)
        id: String,
    },
    /// List all accounts
    List,
    /// Rename an account holder
    Update {
        id: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
    /// Delete an account without funds
    Delete { id: String },
    /// Deposit funds into an account
    Deposit {
        #[arg(long)]
        account: String,
        #[arg(long)]
        amount: i64,
    },
    /// Show the payments on an account's statement
    Statement { id: String },
}

#[derive(Subcommand)]
enum PaymentCommands {
    /// Authorize a card payment to the merchant
    Auth {
        #[arg(long)]
        payer: String,
        #[arg(long)]
        order: String,
        #[arg(long)]
        amount: i64,
        #[arg(long, default_value = "RUB")]
        currency: String,
        #[arg(long)]
        card_number: String,
        #[arg(long)]
        expiry_month: i32,
        #[arg(long)]
        expiry_year: i32,
        #[arg(long)]
        security_code: String,
    },
    /// Capture an authorization
    Capture {
        id: String,
        #[arg(long)]
        order: String,
        #[arg(long)]
        amount: i64,
    },
    /// Refund a capture
    Refund {
        id: String,
        #[arg(long)]
        order: String,
        #[arg(long)]
        amount: i64,
    },
    /// Cancel an authorization
    Cancel {
        id: String,
        #[arg(long)]
        order: String,
        #[arg(long)]
        amount: i64,
    },
    /// Get payment details
    Get { id: String },
}

fn parse_currency(s: &str) -> Result<Currency> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Unknown currency: {}. Supported: RUB, USD, EUR, GBP", s))
}

fn parse_account_id(s: &str) -> Result<AccountId> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid account ID: {}", s))
}

fn parse_payment_id(s: &str) -> Result<PaymentId> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid payment ID: {}", s))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut client = PaygateClient::new(&cli.api_url);
    if let Some(merchant) = &cli.merchant {
        client = client.with_merchant(parse_account_id(merchant)?);
    }

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Account { action } => match action {
            AccountCommands::Create {
                first_name,
                last_name,
                currency,
            } => {
                let currency = parse_currency(&currency)?;
                let account = client
                    .create_account(&first_name, &last_name, currency)
                    .await?;
                print_json(&account)?;
            }
            AccountCommands::Get { id } => {
                let account = client.get_account(parse_account_id(&id)?).await?;
                print_json(&account)?;
            }
            AccountCommands::List => {
                print_json(&client.list_accounts().await?)?;
            }
            AccountCommands::Update {
                id,
                first_name,
                last_name,
            } => {
                let req = UpdateAccountRequest {
                    first_name,
                    last_name,
                };
                let account = client.update_account(parse_account_id(&id)?, &req).await?;
                print_json(&account)?;
            }
            AccountCommands::Delete { id } => {
                client.delete_account(parse_account_id(&id)?).await?;
                println!("✓ Account deleted");
            }
            AccountCommands::Deposit { account, amount } => {
                let account = client.deposit(parse_account_id(&account)?, amount).await?;
                print_json(&account)?;
            }
            AccountCommands::Statement { id } => {
                print_json(&client.statement(parse_account_id(&id)?).await?)?;
            }
        },

        Commands::Payment { action } => match action {
            PaymentCommands::Auth {
                payer,
                order,
                amount,
                currency,
                card_number,
                expiry_month,
                expiry_year,
                security_code,
            } => {
                let card = Card {
                    number: card_number,
                    expiry_month,
                    expiry_year,
                    security_code,
                };
                let payment = client
                    .authorize(
                        parse_account_id(&payer)?,
                        &order,
                        amount,
                        parse_currency(&currency)?,
                        card,
                    )
                    .await?;
                print_json(&payment)?;
            }
            PaymentCommands::Capture { id, order, amount } => {
                let payment = client
                    .capture(parse_payment_id(&id)?, &order, amount)
                    .await?;
                print_json(&payment)?;
            }
            PaymentCommands::Refund { id, order, amount } => {
                let payment = client
                    .refund(parse_payment_id(&id)?, &order, amount)
                    .await?;
                print_json(&payment)?;
            }
            PaymentCommands::Cancel { id, order, amount } => {
                let payment = client
                    .cancel(parse_payment_id(&id)?, &order, amount)
                    .await?;
                print_json(&payment)?;
            }
            PaymentCommands::Get { id } => {
                print_json(&client.get_payment(parse_payment_id(&id)?).await?)?;
            }
        },
    }

    Ok(())
}
