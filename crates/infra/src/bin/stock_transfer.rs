//! Move stock between two warehouses on the configured backend.
//!
//! Usage: `stock-transfer <product-id> <source-warehouse-id> <target-warehouse-id> <quantity>`
//!
//! Backend location and credentials come from `STOCK_API_URL`, `STOCK_API_TOKEN`
//! and `STOCK_API_TIMEOUT_MS`.

use anyhow::{Context, bail};

use stockledger_core::{ProductId, WarehouseId};
use stockledger_infra::LedgerConfig;
use stockledger_infra::remote::{HttpStockService, RemoteTransferCoordinator, RemoteTransferError};
use stockledger_inventory::TransferRequest;

fn parse_request(args: &[String]) -> anyhow::Result<TransferRequest> {
    let [product, source, target, quantity] = args else {
        bail!("usage: stock-transfer <product-id> <source-warehouse-id> <target-warehouse-id> <quantity>");
    };

    let product: ProductId = product.parse().context("invalid product id")?;
    let source: WarehouseId = source.parse().context("invalid source warehouse id")?;
    let target: WarehouseId = target.parse().context("invalid target warehouse id")?;
    let quantity: i64 = quantity
        .parse()
        .with_context(|| format!("quantity must be an integer (got {quantity:?})"))?;

    Ok(TransferRequest::new(product, source, target, quantity))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockledger_observability::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let request = parse_request(&args)?;
    request.validate()?;

    let config = LedgerConfig::from_env()?;
    tracing::info!(api = %config.api_base_url, "stock-transfer starting");

    let service = HttpStockService::new(&config)?;
    let coordinator = RemoteTransferCoordinator::new(service);

    match coordinator.transfer(request).await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(err @ RemoteTransferError::CompensationFailed { .. }) => {
            tracing::error!(%err, ?request, "stock may be out of balance");
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}
