pub mod health;
pub mod inventory;
pub mod locations;
pub mod orders;

use std::sync::Arc;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{ledger::LedgerService, orders::OrderService},
};

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub ledger: Arc<LedgerService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        let ledger = Arc::new(LedgerService::new(db_pool.clone(), event_sender.clone()));
        let orders = Arc::new(OrderService::new(
            db_pool,
            ledger.clone(),
            event_sender,
        ));
        Self { orders, ledger }
    }
}
