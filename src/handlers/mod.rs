pub mod common;
pub mod items;
pub mod rfid;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{catalog::CatalogService, ledger::LedgerService},
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub ledger: Arc<LedgerService>,
}

impl AppServices {
    /// Wires the catalog and ledger services to one pool and event channel.
    /// The ledger receives the catalog handle for referential validation.
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        let catalog = Arc::new(CatalogService::new(db_pool.clone(), event_sender.clone()));
        let ledger = Arc::new(LedgerService::new(
            db_pool,
            catalog.clone(),
            event_sender,
        ));

        Self { catalog, ledger }
    }
}
