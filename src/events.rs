use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted by the catalog and ledger services. Delivery is best-effort
/// and in-process; the movement log itself, not the event stream, is the
/// record of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ItemCreated {
        item_id: Uuid,
        item_code: String,
    },
    TagRegistered {
        tag_id: Uuid,
        tag_uid: String,
        item_code: String,
    },
    ItemReceived {
        movement_id: i64,
        tag_uid: String,
        to_location: String,
        quantity: i32,
    },
    ItemMoved {
        movement_id: i64,
        tag_uid: String,
        from_location: Option<String>,
        to_location: String,
        quantity: i32,
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

/// Background loop draining the event channel. Runs until every sender is
/// dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::ItemCreated { item_id, item_code } => {
                info!(%item_id, %item_code, "item created");
            }
            Event::TagRegistered {
                tag_id,
                tag_uid,
                item_code,
            } => {
                info!(%tag_id, %tag_uid, %item_code, "rfid tag registered");
            }
            Event::ItemReceived {
                movement_id,
                tag_uid,
                to_location,
                quantity,
            } => {
                info!(%movement_id, %tag_uid, %to_location, %quantity, "item received");
            }
            Event::ItemMoved {
                movement_id,
                tag_uid,
                from_location,
                to_location,
                quantity,
            } => {
                info!(
                    %movement_id,
                    %tag_uid,
                    from_location = from_location.as_deref().unwrap_or("-"),
                    %to_location,
                    %quantity,
                    "item moved"
                );
            }
        }
    }

    warn!("Event channel closed; stopping event processing loop");
}
