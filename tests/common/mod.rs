use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use uuid::Uuid;

use coldchain_api::{
    config::AppConfig,
    db,
    entities::{location, lot},
    events::{self, EventSender},
    services::ledger::{AddInventoryInput, CreateLocationInput, LedgerService},
    services::orders::OrderService,
    AppState,
};

/// Test harness backed by a migrated in-memory SQLite database. The pool
/// is pinned to a single connection so every caller shares the same
/// `sqlite::memory:` instance.
pub struct TestApp {
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            18080,
            "test".into(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool).await.expect("migrations");

        let (tx, rx) = mpsc::channel(256);
        let event_sender = EventSender::new(tx);
        let event_task = tokio::spawn(events::process_events(rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        Self {
            state,
            _event_task: event_task,
        }
    }

    pub fn orders(&self) -> Arc<OrderService> {
        self.state.services.orders.clone()
    }

    pub fn ledger(&self) -> Arc<LedgerService> {
        self.state.services.ledger.clone()
    }

    /// Creates an open storage location.
    pub async fn location(&self, code: &str, zone: &str, max_qty: i32) -> location::Model {
        self.ledger()
            .create_location(CreateLocationInput {
                code: code.into(),
                zone: zone.into(),
                max_qty,
            })
            .await
            .expect("create location")
    }

    /// Creates a lot and places its full quantity at the given location.
    pub async fn stocked_lot(
        &self,
        sku: &str,
        lot_number: &str,
        expiry_date: NaiveDate,
        quantity: i32,
        location_id: Uuid,
    ) -> lot::Model {
        let (lot, _) = self
            .ledger()
            .add_inventory(AddInventoryInput {
                sku: sku.into(),
                location_id,
                lot_number: lot_number.into(),
                manufacture_date: None,
                expiry_date,
                quantity,
                supplier: Some("Fresh Farms Co".into()),
                origin_country: Some("VN".into()),
            })
            .await
            .expect("add inventory");
        lot
    }
}

/// Days from today, as a date. Keeps expiry fixtures relative to the
/// clock the classifier reads.
pub fn days_from_today(days: i64) -> NaiveDate {
    chrono::Utc::now().date_naive() + chrono::Duration::days(days)
}
