//! Domain events emitted after successful commits.
//!
//! Services send events best-effort once a transaction has committed; a
//! full or closed channel is logged and never fails the originating
//! request. The consumer task is spawned at startup and currently feeds
//! structured logs; downstream integrations subscribe there.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, logging instead of erroring when the channel is
    /// unavailable. Events are advisory; the commit they describe has
    /// already happened.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!("Dropping domain event, channel unavailable: {}", e);
        }
    }
}

/// Everything that can happen to the warehouse core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderLinesReconciled {
        order_id: Uuid,
        lines: usize,
    },
    OrderCompleted(Uuid),
    OrderCancelled(Uuid),

    LotCreated(Uuid),
    InventoryPlaced {
        lot_id: Uuid,
        location_id: Uuid,
        quantity: i32,
    },
    InventoryReleased {
        lot_id: Uuid,
        location_id: Uuid,
        quantity: i32,
    },

    LocationCreated(Uuid),
    LocationStatusChanged {
        location_id: Uuid,
        status: String,
    },
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(%order_id, %old_status, %new_status, "order status changed");
            }
            Event::InventoryPlaced {
                lot_id,
                location_id,
                quantity,
            } => {
                info!(%lot_id, %location_id, quantity, "inventory placed");
            }
            Event::InventoryReleased {
                lot_id,
                location_id,
                quantity,
            } => {
                info!(%lot_id, %location_id, quantity, "inventory released");
            }
            other => info!(event = ?other, "domain event"),
        }
    }
    info!("Event processor stopped");
}
