//! Lot & location ledger: the only writer of `Location.current_qty` and a
//! lot's `available_qty`/`allocated_qty`.
//!
//! Placement is the failure-prone operation: the capacity check and the
//! occupancy increment form a check-then-act sequence that two concurrent
//! writers could interleave. Every mutation here is therefore a
//! compare-and-swap on the row's `version` column inside one transaction;
//! a lost race rolls the transaction back and surfaces a retryable
//! conflict instead of ever overshooting `max_qty`.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    DatabaseConnection, EntityTrait, FromQueryResult, JoinType, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{inventory_record, location, location::LocationStatus, lot},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{capacity, expiry, expiry::ExpiryStatus},
};

#[derive(Debug, Clone)]
pub struct CreateLotInput {
    pub sku: String,
    pub lot_number: String,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: NaiveDate,
    pub total_qty: i32,
    pub supplier: Option<String>,
    pub origin_country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateLocationInput {
    pub code: String,
    pub zone: String,
    pub max_qty: i32,
}

/// `addInventory`: lot creation and placement as one transaction.
#[derive(Debug, Clone)]
pub struct AddInventoryInput {
    pub sku: String,
    pub location_id: Uuid,
    pub lot_number: String,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: NaiveDate,
    pub quantity: i32,
    pub supplier: Option<String>,
    pub origin_country: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InventoryListFilter {
    pub sku: Option<String>,
    pub zone: Option<String>,
    pub location: Option<String>,
    pub expiry_status: Option<ExpiryStatus>,
}

/// One stocked `(lot, location)` binding with its expiry view, as served
/// to inventory listings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventoryRow {
    pub lot_id: Uuid,
    pub location_id: Uuid,
    pub sku: String,
    pub lot_number: String,
    pub zone: String,
    pub location: String,
    pub quantity: i32,
    pub expiry_date: NaiveDate,
    pub expiry_status: ExpiryStatus,
    pub days_until_expiry: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(FromQueryResult)]
struct InventoryJoinRow {
    lot_id: Uuid,
    location_id: Uuid,
    quantity: i32,
    updated_at: DateTime<Utc>,
    sku: String,
    lot_number: String,
    expiry_date: NaiveDate,
    zone: String,
    code: String,
}

#[derive(Clone)]
pub struct LedgerService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl LedgerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a storage location, initially open and empty.
    #[instrument(skip(self))]
    pub async fn create_location(
        &self,
        input: CreateLocationInput,
    ) -> Result<location::Model, ServiceError> {
        if input.code.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "location code must not be empty".into(),
            ));
        }
        if input.max_qty <= 0 {
            return Err(ServiceError::ValidationError(
                "location capacity must be positive".into(),
            ));
        }

        let model = location::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(input.code.trim().to_string()),
            zone: Set(input.zone.trim().to_string()),
            max_qty: Set(input.max_qty),
            current_qty: Set(0),
            status: Set(LocationStatus::Open.to_string()),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            version: Set(1),
        };
        let created = model.insert(&*self.db).await?;

        info!(location_id = %created.id, code = %created.code, "Location created");
        self.event_sender.send(Event::LocationCreated(created.id)).await;
        Ok(created)
    }

    pub async fn list_locations(&self) -> Result<Vec<location::Model>, ServiceError> {
        Ok(location::Entity::find()
            .order_by_asc(location::Column::Code)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_location(&self, location_id: Uuid) -> Result<location::Model, ServiceError> {
        location::Entity::find_by_id(location_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", location_id)))
    }

    /// Takes a location in or out of service. Blocking only stops new
    /// placements; stock already there can still be released.
    #[instrument(skip(self))]
    pub async fn set_location_status(
        &self,
        location_id: Uuid,
        status: LocationStatus,
    ) -> Result<location::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let loc = location::Entity::find_by_id(location_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", location_id)))?;

        let res = location::Entity::update_many()
            .col_expr(location::Column::Status, Expr::value(status.to_string()))
            .col_expr(location::Column::UpdatedAt, Expr::value(Utc::now()))
            .col_expr(location::Column::Version, Expr::value(loc.version + 1))
            .filter(location::Column::Id.eq(location_id))
            .filter(location::Column::Version.eq(loc.version))
            .exec(&txn)
            .await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::ConcurrencyConflict(location_id));
        }
        txn.commit().await?;

        self.event_sender
            .send(Event::LocationStatusChanged {
                location_id,
                status: status.to_string(),
            })
            .await;
        self.get_location(location_id).await
    }

    /// Creates a lot with its full quantity available and nothing allocated.
    #[instrument(skip(self), fields(sku = %input.sku, lot_number = %input.lot_number))]
    pub async fn create_lot(&self, input: CreateLotInput) -> Result<lot::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let created = self.create_lot_in(&txn, &input).await?;
        txn.commit().await?;

        self.event_sender.send(Event::LotCreated(created.id)).await;
        Ok(created)
    }

    pub(crate) async fn create_lot_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        input: &CreateLotInput,
    ) -> Result<lot::Model, ServiceError> {
        if input.lot_number.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "lot number must not be empty".into(),
            ));
        }
        if input.total_qty <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "lot quantity must be positive, got {}",
                input.total_qty
            )));
        }

        let model = lot::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(input.sku.clone()),
            lot_number: Set(input.lot_number.trim().to_string()),
            manufacture_date: Set(input.manufacture_date),
            expiry_date: Set(input.expiry_date),
            total_qty: Set(input.total_qty),
            available_qty: Set(input.total_qty),
            allocated_qty: Set(0),
            supplier: Set(input.supplier.clone()),
            origin_country: Set(input.origin_country.clone()),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            version: Set(1),
        };
        Ok(model.insert(conn).await?)
    }

    pub async fn get_lot(&self, lot_id: Uuid) -> Result<lot::Model, ServiceError> {
        lot::Entity::find_by_id(lot_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Lot {} not found", lot_id)))
    }

    /// Binds `qty` units of a lot to a location, enforcing capacity
    /// atomically against concurrent writers.
    #[instrument(skip(self))]
    pub async fn place_inventory(
        &self,
        lot_id: Uuid,
        location_id: Uuid,
        qty: i32,
    ) -> Result<inventory_record::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let record = self.place_in(&txn, lot_id, location_id, qty).await?;
        txn.commit().await?;

        info!(%lot_id, %location_id, qty, "Inventory placed");
        self.event_sender
            .send(Event::InventoryPlaced {
                lot_id,
                location_id,
                quantity: qty,
            })
            .await;
        Ok(record)
    }

    /// Placement inside an existing transaction. The capacity check and
    /// the occupancy increment stay atomic: the increment only applies if
    /// the location row still carries the version the check saw, and the
    /// transaction rolls back on a lost race.
    pub(crate) async fn place_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        lot_id: Uuid,
        location_id: Uuid,
        qty: i32,
    ) -> Result<inventory_record::Model, ServiceError> {
        if qty <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "placement quantity must be positive, got {}",
                qty
            )));
        }

        let loc = location::Entity::find_by_id(location_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", location_id)))?;
        if loc.is_blocked() {
            return Err(ServiceError::LocationBlocked(loc.code.clone()));
        }
        if !capacity::fits(&loc, qty) {
            return Err(ServiceError::CapacityExceeded {
                location: loc.code.clone(),
                requested: qty,
                available: capacity::headroom(&loc),
            });
        }

        let lot = lot::Entity::find_by_id(lot_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Lot {} not found", lot_id)))?;
        if qty > lot.available_qty {
            return Err(ServiceError::ValidationError(format!(
                "lot {} has only {} available, cannot place {}",
                lot.lot_number, lot.available_qty, qty
            )));
        }

        let now = Utc::now();

        let res = location::Entity::update_many()
            .col_expr(
                location::Column::CurrentQty,
                Expr::value(loc.current_qty + qty),
            )
            .col_expr(location::Column::UpdatedAt, Expr::value(now))
            .col_expr(location::Column::Version, Expr::value(loc.version + 1))
            .filter(location::Column::Id.eq(location_id))
            .filter(location::Column::Version.eq(loc.version))
            .exec(conn)
            .await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::ConcurrencyConflict(location_id));
        }

        let res = lot::Entity::update_many()
            .col_expr(
                lot::Column::AvailableQty,
                Expr::value(lot.available_qty - qty),
            )
            .col_expr(
                lot::Column::AllocatedQty,
                Expr::value(lot.allocated_qty + qty),
            )
            .col_expr(lot::Column::UpdatedAt, Expr::value(now))
            .col_expr(lot::Column::Version, Expr::value(lot.version + 1))
            .filter(lot::Column::Id.eq(lot_id))
            .filter(lot::Column::Version.eq(lot.version))
            .exec(conn)
            .await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::ConcurrencyConflict(lot_id));
        }

        // Any concurrent writer to this pair must win the same location and
        // lot versions first, so the record row itself is already serialized.
        let existing = inventory_record::Entity::find_by_id((lot_id, location_id))
            .one(conn)
            .await?;
        let record = match existing {
            Some(record) => {
                let quantity = record.quantity + qty;
                let mut active: inventory_record::ActiveModel = record.into();
                active.quantity = Set(quantity);
                active.updated_at = Set(now);
                active.update(conn).await?
            }
            None => {
                inventory_record::ActiveModel {
                    lot_id: Set(lot_id),
                    location_id: Set(location_id),
                    quantity: Set(qty),
                    updated_at: Set(now),
                }
                .insert(conn)
                .await?
            }
        };
        Ok(record)
    }

    /// Unbinds `qty` units for shipment or consumption. Shipped goods
    /// leave the ledger entirely: the lot's total shrinks with its
    /// allocation.
    #[instrument(skip(self))]
    pub async fn release_inventory(
        &self,
        lot_id: Uuid,
        location_id: Uuid,
        qty: i32,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        self.release_in(&txn, lot_id, location_id, qty).await?;
        txn.commit().await?;

        info!(%lot_id, %location_id, qty, "Inventory released");
        self.event_sender
            .send(Event::InventoryReleased {
                lot_id,
                location_id,
                quantity: qty,
            })
            .await;
        Ok(())
    }

    pub(crate) async fn release_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        lot_id: Uuid,
        location_id: Uuid,
        qty: i32,
    ) -> Result<(), ServiceError> {
        if qty <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "release quantity must be positive, got {}",
                qty
            )));
        }

        let record = inventory_record::Entity::find_by_id((lot_id, location_id))
            .one(conn)
            .await?
            .ok_or(ServiceError::InsufficientQuantity {
                requested: qty,
                available: 0,
            })?;
        if qty > record.quantity {
            return Err(ServiceError::InsufficientQuantity {
                requested: qty,
                available: record.quantity,
            });
        }

        let loc = location::Entity::find_by_id(location_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", location_id)))?;
        let lot = lot::Entity::find_by_id(lot_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Lot {} not found", lot_id)))?;

        let now = Utc::now();

        let res = location::Entity::update_many()
            .col_expr(
                location::Column::CurrentQty,
                Expr::value(loc.current_qty - qty),
            )
            .col_expr(location::Column::UpdatedAt, Expr::value(now))
            .col_expr(location::Column::Version, Expr::value(loc.version + 1))
            .filter(location::Column::Id.eq(location_id))
            .filter(location::Column::Version.eq(loc.version))
            .exec(conn)
            .await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::ConcurrencyConflict(location_id));
        }

        let res = lot::Entity::update_many()
            .col_expr(
                lot::Column::AllocatedQty,
                Expr::value(lot.allocated_qty - qty),
            )
            .col_expr(lot::Column::TotalQty, Expr::value(lot.total_qty - qty))
            .col_expr(lot::Column::UpdatedAt, Expr::value(now))
            .col_expr(lot::Column::Version, Expr::value(lot.version + 1))
            .filter(lot::Column::Id.eq(lot_id))
            .filter(lot::Column::Version.eq(lot.version))
            .exec(conn)
            .await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::ConcurrencyConflict(lot_id));
        }

        if record.quantity == qty {
            record.delete(conn).await?;
        } else {
            let quantity = record.quantity - qty;
            let mut active: inventory_record::ActiveModel = record.into();
            active.quantity = Set(quantity);
            active.updated_at = Set(now);
            active.update(conn).await?;
        }
        Ok(())
    }

    /// Direct stock intake: creates the lot and places it in one
    /// transaction, so a failed placement never leaves an orphan lot.
    #[instrument(skip(self, input), fields(sku = %input.sku, location_id = %input.location_id))]
    pub async fn add_inventory(
        &self,
        input: AddInventoryInput,
    ) -> Result<(lot::Model, inventory_record::Model), ServiceError> {
        let txn = self.db.begin().await?;
        let lot = self
            .create_lot_in(
                &txn,
                &CreateLotInput {
                    sku: input.sku.clone(),
                    lot_number: input.lot_number.clone(),
                    manufacture_date: input.manufacture_date,
                    expiry_date: input.expiry_date,
                    total_qty: input.quantity,
                    supplier: input.supplier.clone(),
                    origin_country: input.origin_country.clone(),
                },
            )
            .await?;
        let record = self
            .place_in(&txn, lot.id, input.location_id, input.quantity)
            .await?;
        txn.commit().await?;

        self.event_sender.send(Event::LotCreated(lot.id)).await;
        self.event_sender
            .send(Event::InventoryPlaced {
                lot_id: lot.id,
                location_id: input.location_id,
                quantity: input.quantity,
            })
            .await;

        // Re-read so the returned lot reflects the placement
        let lot = self.get_lot(lot.id).await?;
        Ok((lot, record))
    }

    /// Joined inventory listing with the expiry view computed against the
    /// current clock. The expiry tier is derived on every read and never
    /// stored.
    #[instrument(skip(self))]
    pub async fn list_inventory(
        &self,
        filter: InventoryListFilter,
    ) -> Result<Vec<InventoryRow>, ServiceError> {
        let mut query = inventory_record::Entity::find()
            .join(JoinType::InnerJoin, inventory_record::Relation::Lot.def())
            .join(
                JoinType::InnerJoin,
                inventory_record::Relation::Location.def(),
            )
            .select_only()
            .column(inventory_record::Column::LotId)
            .column(inventory_record::Column::LocationId)
            .column(inventory_record::Column::Quantity)
            .column(inventory_record::Column::UpdatedAt)
            .column_as(lot::Column::Sku, "sku")
            .column_as(lot::Column::LotNumber, "lot_number")
            .column_as(lot::Column::ExpiryDate, "expiry_date")
            .column_as(location::Column::Zone, "zone")
            .column_as(location::Column::Code, "code");

        if let Some(sku) = &filter.sku {
            query = query.filter(lot::Column::Sku.eq(sku.clone()));
        }
        if let Some(zone) = &filter.zone {
            query = query.filter(location::Column::Zone.eq(zone.clone()));
        }
        if let Some(code) = &filter.location {
            query = query.filter(location::Column::Code.eq(code.clone()));
        }

        let rows = query
            .order_by_asc(lot::Column::ExpiryDate)
            .into_model::<InventoryJoinRow>()
            .all(&*self.db)
            .await?;

        let today = Utc::now().date_naive();
        let listed = rows
            .into_iter()
            .map(|row| {
                let status = expiry::classify(row.expiry_date, today);
                InventoryRow {
                    lot_id: row.lot_id,
                    location_id: row.location_id,
                    sku: row.sku,
                    lot_number: row.lot_number,
                    zone: row.zone,
                    location: row.code,
                    quantity: row.quantity,
                    expiry_date: row.expiry_date,
                    expiry_status: status,
                    days_until_expiry: expiry::days_until_expiry(row.expiry_date, today),
                    updated_at: row.updated_at,
                }
            })
            .filter(|row| {
                filter
                    .expiry_status
                    .map_or(true, |wanted| row.expiry_status == wanted)
            })
            .collect();
        Ok(listed)
    }
}
