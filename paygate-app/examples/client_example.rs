//! Client example walking a card payment through its lifecycle against an in-process server.
//!
//! Run with: cargo run -p paygate-app --example client_example --no-default-features --features sqlite

use paygate_client::PaygateClient;
use paygate_hex::{PaymentService, inbound::HttpServer};
use paygate_repo::build_repo;
use paygate_types::Currency;
use std::net::SocketAddr;
use tempfile::tempdir;
use tokio::net::TcpListener;

fn rubles(amount: i64) -> String {
    format!("{:.2} ₽", amount as f64 / 100.0)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    // Bind first so the server owns the port.
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;

    // Use a temp file-backed SQLite DB
    let tmp = tempdir()?;
    let db_path = tmp.path().join("paygate.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    println!("🚀 Starting server on {addr}...");
    println!("   Database: {db_url}");

    let repo = build_repo(&db_url).await?;
    let router = HttpServer::new(PaymentService::new(repo)).router();
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router.into_make_service()).await {
            eprintln!("server stopped: {e}");
        }
    });

    let client = PaygateClient::new(format!("http://{addr}"));
    println!("✅ Server health: {}", client.health().await?);

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: authorize, partial capture, refund, cancel the rest
    // ─────────────────────────────────────────────────────────────────────────

    let olga = client.create_account("Olga", "Ivanova", Currency::RUB).await?;
    let shop = client.create_account("Corner", "Shop", Currency::RUB).await?;
    println!("✅ Payer {} with card {}", olga.id, olga.card.number);
    println!("✅ Merchant {}", shop.id);

    client.deposit(olga.id, 10_000).await?;

    let merchant = client.with_merchant(shop.id);

    let declined = merchant
        .authorize(olga.id, "order-1", 50_000, Currency::RUB, olga.card.clone())
        .await?;
    println!("⛔ Oversized authorization: {}", declined.status);

    let auth = merchant
        .authorize(olga.id, "order-2", 6_000, Currency::RUB, olga.card.clone())
        .await?;
    println!("✅ Authorized {} ({})", rubles(6_000), auth.status);

    let capture = merchant.capture(auth.id, "order-2", 4_000).await?;
    println!("✅ Captured {} ({})", rubles(4_000), capture.status);

    let refund = merchant.refund(capture.id, "order-2", 1_000).await?;
    println!("✅ Refunded {} ({})", rubles(1_000), refund.status);

    let cancel = merchant.cancel(auth.id, "order-2", 2_000).await?;
    println!("✅ Cancelled {} ({})", rubles(2_000), cancel.status);

    let again = merchant.capture(auth.id, "order-2", 1).await?;
    println!("⛔ Capture after cancel: {}", again.status);

    for account in merchant.list_accounts().await? {
        println!(
            "   - {} {}: balance {}, held {}",
            account.first_name,
            account.last_name,
            rubles(account.balance),
            rubles(account.held)
        );
    }

    println!("\n📋 Payer statement:");
    for payment in merchant.statement(olga.id).await? {
        println!(
            "   - {} {} {}",
            payment.operation,
            rubles(payment.amount.amount()),
            payment.status
        );
    }

    println!("\n🎉 Example completed successfully!");
    Ok(())
}
