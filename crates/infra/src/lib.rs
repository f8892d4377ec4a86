//! Infrastructure layer: repository, ledger services, config, remote backend.

pub mod aggregator;
pub mod config;
pub mod ledger;
pub mod publisher;
pub mod remote;
pub mod repository;
pub mod transfer;

mod integration_tests;

pub use aggregator::{InventoryAggregator, ProductStockStatus, ProductSummary, WarehouseStock};
pub use config::{LedgerConfig, LedgerPolicy};
pub use ledger::{AddStock, StockLedger};
pub use publisher::StockEventPublisher;
pub use repository::{InMemoryStockRepository, StockRepository};
pub use transfer::TransferCoordinator;
