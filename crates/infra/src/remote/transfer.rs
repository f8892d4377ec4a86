//! Transfer against the remote backend as two stock posts plus a compensating
//! post when the second leg fails.
//!
//! The backend has no pair endpoint, so atomicity is recovered by hand:
//!
//! ```text
//! POST source  -q   (fails → nothing moved, return the error)
//! POST target  +q   (fails → POST source +q to undo)
//!                   (undo fails → CompensationFailed, needs manual reconciliation)
//! ```
//!
//! Nothing here retries. Retrying a transfer whose outcome is unknown could move
//! the units twice, so that decision stays with the caller.

use thiserror::Error;

use stockledger_core::LedgerError;
use stockledger_inventory::{TransferOutcome, TransferRequest};

use super::{RemoteError, StockPost, StockService};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteTransferError {
    /// Failed before any stock moved.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The target leg failed and the source decrement was undone.
    #[error("transfer rolled back: {cause}")]
    RolledBack { cause: RemoteError },

    /// The target leg failed and undoing the source decrement failed too.
    #[error("transfer compensation failed (cause: {cause}; compensation: {compensation})")]
    CompensationFailed {
        cause: RemoteError,
        compensation: RemoteError,
    },
}

impl From<LedgerError> for RemoteTransferError {
    fn from(err: LedgerError) -> Self {
        RemoteTransferError::Remote(err.into())
    }
}

#[derive(Debug)]
pub struct RemoteTransferCoordinator<S> {
    service: S,
}

impl<S: StockService> RemoteTransferCoordinator<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    #[tracing::instrument(
        skip(self, request),
        fields(
            product_id = %request.product_id,
            source = %request.source_warehouse_id,
            target = %request.target_warehouse_id,
            quantity = request.quantity,
        )
    )]
    pub async fn transfer(&self, request: TransferRequest) -> Result<TransferOutcome, RemoteTransferError> {
        request.validate()?;

        let source_key = request.source_key();
        let target_key = request.target_key();

        // Early check against the last known state; the backend stays authoritative.
        let current = self.service.fetch(source_key).await?;
        if current.quantity() < request.quantity {
            return Err(LedgerError::insufficient_stock(request.quantity, current.quantity()).into());
        }

        let source = self
            .service
            .post_stock(source_key, &StockPost::delta(-request.quantity))
            .await?;

        match self
            .service
            .post_stock(target_key, &StockPost::delta(request.quantity))
            .await
        {
            Ok(target) => {
                tracing::info!(
                    source_quantity = source.quantity(),
                    target_quantity = target.quantity(),
                    "remote transfer committed"
                );
                Ok(TransferOutcome { source, target })
            }
            Err(cause) => {
                tracing::warn!(%cause, "target leg failed; compensating source");
                match self
                    .service
                    .post_stock(source_key, &StockPost::delta(request.quantity))
                    .await
                {
                    Ok(_) => Err(RemoteTransferError::RolledBack { cause }),
                    Err(compensation) => {
                        tracing::error!(
                            %cause,
                            %compensation,
                            "transfer left source decremented; manual reconciliation required"
                        );
                        Err(RemoteTransferError::CompensationFailed { cause, compensation })
                    }
                }
            }
        }
    }
}
