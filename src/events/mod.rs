use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Events emitted after a mutation commits. The in-transaction pipeline
/// (batch delta, stock recompute, alert evaluation) is an explicit call
/// sequence; these events exist for observers, not for consistency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    BatchReceived {
        batch_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: Decimal,
    },
    BatchDeleted {
        batch_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
    },
    MovementRecorded {
        movement_id: Uuid,
        movement_type: String,
        total_quantity: Decimal,
        batch_ids: Vec<Uuid>,
    },
    MovementReversed {
        movement_id: Uuid,
    },
    StockRecalculated {
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity_on_hand: Decimal,
        status: String,
    },
    AlertOpened {
        alert_id: Uuid,
        alert_type: String,
        product_id: Uuid,
        warehouse_id: Uuid,
    },
    AlertAcknowledged {
        alert_id: Uuid,
    },
    AlertResolved {
        alert_id: Uuid,
        auto: bool,
    },
    ReorderPolicyUpserted {
        policy_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
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

/// Background consumer draining the event channel.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "event processed");
    }
    info!("event channel closed; processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_fails_once_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        drop(rx);

        let result = sender
            .send(Event::MovementReversed {
                movement_id: Uuid::new_v4(),
            })
            .await;
        assert!(result.is_err());
    }
}
