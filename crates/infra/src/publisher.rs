//! Publication of committed stock events.

use std::sync::Mutex;

use stockledger_core::{LedgerError, LedgerResult};
use stockledger_events::{EventBus, EventEnvelope};
use stockledger_inventory::StockEvent;

/// Runs repository writes and publishes their events under one lock, so
/// sequence numbers and delivery order both follow commit order.
///
/// Every writer sharing a repository must go through the same publisher,
/// otherwise commits made elsewhere are not ordered against these.
///
/// A bus failure is logged and otherwise ignored: the stock has already moved,
/// and surfacing an error would invite a retry that moves it twice.
#[derive(Debug)]
pub struct StockEventPublisher<B> {
    bus: B,
    sequence: Mutex<u64>,
}

impl<B> StockEventPublisher<B>
where
    B: EventBus<EventEnvelope<StockEvent>>,
{
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            sequence: Mutex::new(0),
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Last sequence number handed out (0 before the first publish).
    pub fn last_sequence(&self) -> u64 {
        match self.sequence.lock() {
            Ok(seq) => *seq,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Run `write`; if it commits, publish the events built from its result
    /// before any other writer can commit.
    ///
    /// A failed write publishes nothing and consumes no sequence numbers.
    pub fn commit<T>(
        &self,
        write: impl FnOnce() -> LedgerResult<T>,
        events: impl FnOnce(&T) -> Vec<StockEvent>,
    ) -> LedgerResult<T> {
        let mut sequence = self
            .sequence
            .lock()
            .map_err(|_| LedgerError::storage("event sequence lock poisoned"))?;

        let committed = write()?;
        for event in events(&committed) {
            *sequence += 1;
            let seq = *sequence;
            let envelope = EventEnvelope::wrap(seq, event);
            let event_type = envelope.event_type().to_string();
            if let Err(err) = self.bus.publish(envelope) {
                tracing::warn!(sequence = seq, event_type = %event_type, ?err, "failed to publish stock event");
            }
        }
        Ok(committed)
    }
}
