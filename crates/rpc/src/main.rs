//! `finvoice` command-line interface

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use finvoice_connect::{MockDocumentVault, MockNotifier, MockSettlementNetwork};
use finvoice_core::{Amount, BasisPoints, Currency, InvestorId};
use finvoice_ledger::InvoiceDraft;
use finvoice_risk::{RiskEngine, RiskInput};
use finvoice_rpc::{AppContext, RiskContext};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "finvoice", version, about = "Invoice funding ledger")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score an invoice without creating it
    Assess {
        /// Invoice face value
        #[arg(long)]
        principal: Decimal,
        /// ISO 4217 currency code
        #[arg(long, default_value = "USD")]
        currency: String,
        /// Days until the buyer is expected to pay
        #[arg(long)]
        tenor_days: u32,
        /// Quoted yield in basis points
        #[arg(long)]
        yield_bps: i64,
        #[arg(long)]
        industry: Option<String>,
    },
    /// Run an end-to-end funding scenario against in-memory collaborators
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Assess {
            principal,
            currency,
            tenor_days,
            yield_bps,
            industry,
        } => assess(principal, &currency, tenor_days, yield_bps, industry),
        Commands::Demo => demo().await,
    }
}

fn assess(
    principal: Decimal,
    currency: &str,
    tenor_days: u32,
    yield_bps: i64,
    industry: Option<String>,
) -> anyhow::Result<()> {
    let assessment = RiskEngine::new().assess(&RiskInput {
        principal: Amount::new(principal).context("invalid principal")?,
        currency: currency.parse::<Currency>().context("invalid currency")?,
        tenor_days,
        quoted_yield: BasisPoints(yield_bps),
        industry,
        seller_history: None,
        buyer_history: None,
        market: None,
    });
    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}

async fn demo() -> anyhow::Result<()> {
    let vault = Arc::new(MockDocumentVault::new());
    let network = Arc::new(MockSettlementNetwork::new());
    let notifier = Arc::new(MockNotifier::new());
    let app = AppContext::new(vault.clone(), network.clone(), notifier.clone());

    let invoice = app.create_invoice(
        InvoiceDraft {
            seller_id: "demo-seller".into(),
            buyer_name: "Acme GmbH".into(),
            principal: Amount::from_major(10_000),
            currency: Currency::Usd,
            tenor_days: 60,
            quoted_yield: BasisPoints(800),
            funding_goal: None,
            industry: Some("manufacturing".into()),
        },
        RiskContext::default(),
    )?;
    println!(
        "created invoice {} (risk {} / {}, suggested adjustment {})",
        invoice.id, invoice.risk.score, invoice.risk.grade, invoice.risk.yield_adjustment
    );

    vault.file_documents(invoice.id);
    app.submit_for_review(invoice.id).await?;
    app.approve(invoice.id).await?;
    let listed = app.list_invoice(invoice.id).await?;
    println!("listed with status {}", listed.status);

    let a = app
        .invest(invoice.id, InvestorId::new(), Amount::from_major(4_000))
        .await?;
    println!(
        "investor A reserved {} (share {}) -> {}",
        a.investment.amount, a.investment.share_percentage, a.invoice.status
    );
    let b = app
        .invest(invoice.id, InvestorId::new(), Amount::from_major(6_000))
        .await?;
    println!(
        "investor B reserved {} (share {}) -> {}",
        b.investment.amount, b.investment.share_percentage, b.invoice.status
    );

    let settlement = app
        .record_payment(
            invoice.id,
            Amount::from_major(10_000),
            "wire-demo-0001",
            Amount::from_major(200),
        )
        .await?;
    println!(
        "payment settled: gross {}, fee {}, payout {}",
        settlement.record.gross, settlement.record.platform_fee, settlement.record.total_payout
    );

    for (label, investment_id) in [("A", a.investment.id), ("B", b.investment.id)] {
        let payout = app.claim(investment_id)?;
        println!("investor {label} claimed {}", payout.amount);
    }

    println!("notifications sent: {}", notifier.sent().len());
    println!("settlement network calls: {}", network.calls());
    Ok(())
}
