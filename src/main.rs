//! Finanalyst main entry point

use anyhow::Context;
use clap::Parser;
use finanalyst_config::{Config, ConfigError};
use finanalyst_core::{
    AppContext, Expense, HyperTransport, InMemoryBackend, Income, Transaction, TransportRef,
};
use finanalyst_web::start_server;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "finanalyst")]
#[command(author = "Finanalyst Contributors")]
#[command(version = "0.1.0")]
#[command(about = "A lightweight frontend for expenses, incomes and transactions", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Serve from an in-process backend seeded with demo records
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (config, missing) = match Config::load(&args.config) {
        Ok(config) => (config, false),
        Err(ConfigError::FileNotFound { .. }) => (Config::default(), true),
        Err(e) => {
            eprintln!("[{}] {}: {}", e.severity(), e.code(), e);
            for suggestion in e.suggestions() {
                eprintln!("  - {}", suggestion);
            }
            return Err(e).with_context(|| {
                format!("Failed to load configuration from {}", args.config.display())
            });
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    if missing {
        log::warn!(
            target: "finanalyst",
            "Config file {} not found, using defaults",
            args.config.display()
        );
    }

    let transport: TransportRef = if args.in_memory {
        log::info!(target: "finanalyst", "Serving from the in-memory backend");
        Arc::new(demo_backend().context("Failed to seed the in-memory backend")?)
    } else {
        log::info!(
            target: "finanalyst",
            "REST backend: {} (timeout {}s)",
            config.backend.base_url,
            config.backend.timeout_secs
        );
        Arc::new(HyperTransport::new(
            config.backend.base_url.clone(),
            config.backend.timeout(),
        ))
    };

    let ctx = Arc::new(AppContext::new(transport));
    start_server(config, ctx)
        .await
        .context("Web server failed")
}

fn demo_backend() -> finanalyst_core::ClientResult<InMemoryBackend> {
    let backend = InMemoryBackend::new()
        .with_collection::<Expense>()
        .with_collection::<Income>()
        .with_collection::<Transaction>();

    let text = |s: &str| Some(s.to_string());
    backend.seed(vec![
        Expense {
            id: None,
            category: text("Housing"),
            name: text("Rent"),
            search_string1: text("LANDLORD"),
            search_string2: None,
        },
        Expense {
            id: None,
            category: text("Food"),
            name: text("Groceries"),
            search_string1: text("MARKET"),
            search_string2: text("GROCER"),
        },
    ])?;
    backend.seed(vec![Income {
        id: None,
        name: text("Salary"),
        search_string1: text("PAYROLL"),
        search_string2: None,
    }])?;
    backend.seed(vec![
        Transaction {
            account_type: text("CHQ"),
            transaction_date: chrono::DateTime::parse_from_rfc3339("2024-01-01T09:00:00Z")
                .ok()
                .map(|d| d.with_timezone(&chrono::Utc)),
            description1: text("PAYROLL DEPOSIT"),
            amount_cad: Some(Decimal::new(250_000, 2)),
            is_tracked: Some(true),
            income: Some(Income {
                id: Some(1),
                ..Default::default()
            }),
            ..Default::default()
        },
        Transaction {
            account_type: text("CHQ"),
            transaction_date: chrono::DateTime::parse_from_rfc3339("2024-01-02T12:30:00Z")
                .ok()
                .map(|d| d.with_timezone(&chrono::Utc)),
            description1: text("LANDLORD PAYMENT"),
            amount_cad: Some(Decimal::new(-120_000, 2)),
            expense: Some(Expense {
                id: Some(1),
                ..Default::default()
            }),
            ..Default::default()
        },
    ])?;

    Ok(backend)
}
