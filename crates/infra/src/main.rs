use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde_json::json;

use costledger_core::TenantId;
use costledger_events::InMemoryEventBus;
use costledger_infra::{
    InMemoryProductRepository, ProductRepository, StockMovementService, ValuationConfig, script,
};

/// Replay a stock movement script against an in-memory store and print the
/// resulting valuation as JSON.
///
/// Valuation settings come from COSTLEDGER_AUTO_REPAIR and
/// COSTLEDGER_DEFAULT_METHOD; log verbosity from RUST_LOG.
#[derive(Debug, Parser)]
#[command(name = "costledger-replay", version)]
struct Args {
    /// JSON movement script. Read from stdin when omitted.
    script: Option<PathBuf>,
}

impl Args {
    fn read_script(&self) -> anyhow::Result<String> {
        match &self.script {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display())),
            None => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read stdin")?;
                Ok(buf)
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    costledger_observability::init();

    let input = args.read_script()?;
    let movements = script::parse(&input).context("invalid movement script")?;
    let config = ValuationConfig::from_env();
    tracing::info!(
        movements = movements.len(),
        auto_repair = config.auto_repair,
        default_method = %config.default_method,
        "replaying movement script"
    );

    let service = StockMovementService::new(
        InMemoryProductRepository::new(),
        InMemoryEventBus::new(),
        config,
    );
    let tenant_id = TenantId::new();

    let outcomes = script::replay(&service, tenant_id, &movements);
    let reconciliation = service.reconcile(tenant_id)?;
    let report = json!({
        "outcomes": outcomes,
        "products": service.repository().list(tenant_id),
        "summary": service.summary(tenant_id),
        "reconciliation": reconciliation,
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
