//! Transfer coordinator: moves units of a product between two warehouses as a
//! single repository commit.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::instrument;

use stockledger_core::{LedgerError, LedgerResult};
use stockledger_events::{EventBus, EventEnvelope};
use stockledger_inventory::{StockEvent, StockRecord, TransferOutcome, TransferRequest};

use crate::config::LedgerPolicy;
use crate::ledger::{ensure_product, ensure_warehouse};
use crate::publisher::StockEventPublisher;
use crate::repository::StockRepository;

#[derive(Debug)]
pub struct TransferCoordinator<R, B> {
    repo: R,
    events: Arc<StockEventPublisher<B>>,
    policy: LedgerPolicy,
}

impl<R, B> TransferCoordinator<R, B>
where
    R: StockRepository,
    B: EventBus<EventEnvelope<StockEvent>>,
{
    pub fn new(repo: R, events: Arc<StockEventPublisher<B>>, policy: LedgerPolicy) -> Self {
        Self {
            repo,
            events,
            policy,
        }
    }

    /// Move `request.quantity` units from source to target.
    ///
    /// Both records are written by one `save_pair`, so a concurrent reader sees
    /// either the old pair or the new pair. On any error neither record changes.
    /// A concurrent writer on either record surfaces as `StaleWrite`; retrying is
    /// left to the caller.
    #[instrument(
        skip(self, request),
        fields(
            product_id = %request.product_id,
            source = %request.source_warehouse_id,
            target = %request.target_warehouse_id,
            quantity = request.quantity,
        )
    )]
    pub fn transfer(&self, request: TransferRequest) -> LedgerResult<TransferOutcome> {
        request.validate()?;

        ensure_product(&self.repo, request.product_id)?;
        ensure_warehouse(&self.repo, request.source_warehouse_id)?;
        ensure_warehouse(&self.repo, request.target_warehouse_id)?;

        let source_key = request.source_key();
        let source = self
            .repo
            .get(source_key)?
            .ok_or_else(|| LedgerError::not_found(format!("no stock record for {source_key}")))?;

        let now = Utc::now();
        let target_key = request.target_key();
        let (target, target_opened) = match self.repo.get(target_key)? {
            Some(existing) => (existing, false),
            None => {
                // A new row starts empty and unpriced; price never travels with units.
                let opened =
                    StockRecord::open(target_key, Decimal::ZERO, self.policy.default_minimum_stock, now)?;
                (opened, true)
            }
        };

        let outcome = request.apply(&source, &target, now).inspect_err(|err| {
            tracing::info!(available = source.quantity(), %err, "transfer rejected");
        })?;

        let (source, target) = self.events.commit(
            || self.repo.save_pair(outcome.source, outcome.target),
            |(source, target): &(StockRecord, StockRecord)| {
                let mut events = Vec::with_capacity(2);
                if target_opened {
                    events.push(StockEvent::RecordOpened {
                        key: target_key,
                        occurred_at: now,
                    });
                }
                events.push(StockEvent::StockTransferred {
                    product_id: request.product_id,
                    source: request.source_warehouse_id,
                    target: request.target_warehouse_id,
                    quantity: request.quantity,
                    source_quantity: source.quantity(),
                    target_quantity: target.quantity(),
                    occurred_at: now,
                });
                events
            },
        )?;
        tracing::info!(
            source_quantity = source.quantity(),
            target_quantity = target.quantity(),
            "stock transferred"
        );

        Ok(TransferOutcome { source, target })
    }
}
