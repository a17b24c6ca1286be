use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services after a successful commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog events
    CategoryCreated(Uuid),
    CategoryReparented {
        category_id: Uuid,
        new_parent_id: Option<Uuid>,
    },
    ProductCreated(Uuid),
    CategoryAssigned {
        product_id: Uuid,
        category_id: Uuid,
        is_primary: bool,
    },
    StockAdjusted {
        product_id: Uuid,
        old_quantity: Decimal,
        new_quantity: Decimal,
        reason: String,
    },

    // Ledger events
    TransactionOpened(Uuid),
    TransactionLineAdded {
        transaction_id: Uuid,
        line_id: Uuid,
        product_id: Uuid,
    },
    TransactionFinalized {
        transaction_id: Uuid,
        total: Decimal,
    },
    TransactionCancelled(Uuid),
    TransactionVoided(Uuid),

    // Return events
    ReturnFiled {
        return_id: Uuid,
        transaction_line_id: Uuid,
        quantity: Decimal,
    },
    ReturnProcessed {
        return_id: Uuid,
        refund_amount: Decimal,
        timestamp: DateTime<Utc>,
    },
    ReturnRejected(Uuid),
    ReturnCancelled(Uuid),

    // Entity lifecycle events
    EntitySoftDeleted {
        entity: String,
        id: Uuid,
    },
    EntityRestored {
        entity: String,
        id: Uuid,
    },
    AttachmentLinked {
        attachment_id: Uuid,
        owner: String,
        owner_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Creates a bounded event channel pair.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Consumes events from the channel until all senders are dropped.
///
/// Delivery is best-effort: services log and continue when the channel is
/// full or closed, so this loop must never become a correctness dependency.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::TransactionFinalized {
                transaction_id,
                total,
            } => {
                info!(transaction_id = %transaction_id, total = %total, "Transaction finalized");
            }
            Event::StockAdjusted {
                product_id,
                old_quantity,
                new_quantity,
                reason,
            } => {
                info!(
                    product_id = %product_id,
                    old = %old_quantity,
                    new = %new_quantity,
                    reason = %reason,
                    "Stock adjusted"
                );
            }
            Event::ReturnProcessed {
                return_id,
                refund_amount,
                ..
            } => {
                info!(return_id = %return_id, refund = %refund_amount, "Return processed");
            }
            other => {
                info!(event = ?other, "Event received");
            }
        }
    }

    warn!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (sender, mut rx) = channel(8);
        sender
            .send(Event::TransactionOpened(Uuid::new_v4()))
            .await
            .expect("send succeeds");

        let received = rx.recv().await.expect("event received");
        assert!(matches!(received, Event::TransactionOpened(_)));
    }

    #[tokio::test]
    async fn send_fails_after_receiver_dropped() {
        let (sender, rx) = channel(1);
        drop(rx);

        let result = sender.send(Event::TransactionCancelled(Uuid::new_v4())).await;
        assert!(result.is_err());
    }
}
