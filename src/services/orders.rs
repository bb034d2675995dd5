//! Order lifecycle: creation, the strict status chain, line
//! reconciliation, and completion.
//!
//! Transitions are a linear chain per direction, mirroring the physical
//! receiving/shipping workflow: steps cannot be skipped or reordered, and
//! `CANCELLED` is reachable from any non-terminal status. Completion and
//! its ledger commitment run in one transaction, so an order is never
//! COMPLETED with half its lines placed.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    DatabaseConnection, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        order,
        order::{InboundStatus, OrderDirection, OrderPriority, OrderStatus, OutboundStatus},
        order_line,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        ledger::{CreateLotInput, LedgerService},
        reconciliation,
        reconciliation::OrderTotals,
    },
};

#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub direction: OrderDirection,
    pub counterparty_name: String,
    pub carrier: Option<String>,
    pub scheduled_time: chrono::DateTime<Utc>,
    pub priority: OrderPriority,
    pub notes: Option<String>,
    pub lines: Vec<CreateOrderLineInput>,
}

#[derive(Debug, Clone)]
pub struct CreateOrderLineInput {
    pub sku: String,
    pub quantity: i32,
    pub unit: String,
}

/// One reconciliation update. Outbound picks arrive with
/// `damaged_qty == 0` and the pulled `lot_id`/`location_id`; inbound
/// receipts carry the clerk's lot details and the putaway target.
#[derive(Debug, Clone)]
pub struct ReconcileLineUpdate {
    pub line_id: Uuid,
    pub received_qty: i32,
    pub damaged_qty: i32,
    pub lot_number: Option<String>,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub lot_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

/// An order with its lines and derived totals, as returned by every
/// mutating operation so callers render canonical server state.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub order: order::Model,
    pub lines: Vec<order_line::Model>,
    pub totals: OrderTotals,
}

#[derive(Debug, Clone, Default)]
pub struct OrderListFilter {
    pub direction: Option<OrderDirection>,
    pub status: Option<String>,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<order::Model>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    ledger: Arc<LedgerService>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        ledger: Arc<LedgerService>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            ledger,
            event_sender,
        }
    }

    /// Creates an order in its initial status with one line per requested
    /// product. Lines are fixed in count from here on.
    #[instrument(skip(self, input), fields(direction = %input.direction))]
    pub async fn create_order(&self, input: CreateOrderInput) -> Result<OrderDetails, ServiceError> {
        if input.counterparty_name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "counterparty name must not be empty".into(),
            ));
        }
        if input.lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "an order needs at least one line".into(),
            ));
        }
        for (idx, line) in input.lines.iter().enumerate() {
            if line.sku.trim().is_empty() {
                return Err(ServiceError::ValidationError(format!(
                    "lines[{}]: sku must not be empty",
                    idx
                )));
            }
            if line.quantity <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "lines[{}]: quantity must be positive, got {}",
                    idx, line.quantity
                )));
            }
        }

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let status = OrderStatus::initial(input.direction);

        let txn = self.db.begin().await?;

        let order_model = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(next_order_number(input.direction)),
            direction: Set(input.direction.to_string()),
            status: Set(status.to_string()),
            priority: Set(input.priority.to_string()),
            counterparty_name: Set(input.counterparty_name.trim().to_string()),
            carrier: Set(input.carrier.clone()),
            scheduled_time: Set(input.scheduled_time),
            notes: Set(input.notes.clone()),
            created_at: Set(now),
            updated_at: Set(None),
            version: Set(1),
        }
        .insert(&txn)
        .await?;

        for (idx, line) in input.lines.iter().enumerate() {
            order_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                line_no: Set(idx as i32 + 1),
                sku: Set(line.sku.trim().to_string()),
                expected_qty: Set(line.quantity),
                received_qty: Set(None),
                damaged_qty: Set(None),
                accepted_qty: Set(None),
                unit: Set(line.unit.clone()),
                lot_number: Set(None),
                manufacture_date: Set(None),
                expiry_date: Set(None),
                lot_id: Set(None),
                location_id: Set(None),
                created_at: Set(now),
                updated_at: Set(None),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        info!(order_id = %order_id, order_number = %order_model.order_number, "Order created");
        self.event_sender.send(Event::OrderCreated(order_id)).await;

        self.get_order(order_id).await
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDetails, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        let lines = self.load_lines(&*self.db, order_id).await?;
        let totals = reconciliation::totals(&lines);
        Ok(OrderDetails {
            order,
            lines,
            totals,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_orders(&self, filter: OrderListFilter) -> Result<OrderPage, ServiceError> {
        let page = filter.page.max(1);
        let limit = filter.limit.clamp(1, 100);

        let mut query = order::Entity::find().order_by_desc(order::Column::CreatedAt);
        if let Some(direction) = filter.direction {
            query = query.filter(order::Column::Direction.eq(direction.to_string()));
        }
        if let Some(raw) = &filter.status {
            let status = parse_status_filter(filter.direction, raw)?;
            query = query.filter(order::Column::Status.eq(status.to_string()));
        }

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;
        Ok(OrderPage {
            orders,
            total,
            page,
            limit,
        })
    }

    /// Moves the order along its chain. The target must be the single
    /// designated successor, or `CANCELLED` from a non-terminal status.
    /// Transitioning into the final status runs the full completion path,
    /// ledger commitment included.
    #[instrument(skip(self), fields(order_id = %order_id, target = %target))]
    pub async fn transition(
        &self,
        order_id: Uuid,
        target: &str,
    ) -> Result<OrderDetails, ServiceError> {
        let txn = self.db.begin().await?;
        let order = self.load_order(&txn, order_id).await?;
        let (direction, current) = parsed_status(&order)?;

        let target = OrderStatus::parse(direction, target).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "'{}' is not a valid status for an {} order",
                target, direction
            ))
        })?;
        if !current.can_transition_to(target) {
            return Err(ServiceError::InvalidTransition {
                from: current.to_string(),
                to: target.to_string(),
            });
        }

        let ledger_events = if target.is_terminal() && !target.is_cancelled() {
            // Final chain step: commit reconciled lines into the ledger
            // within this same transaction.
            self.commit_lines_to_ledger(&txn, &order, direction).await?
        } else {
            Vec::new()
        };

        self.swap_status(&txn, &order, target).await?;
        txn.commit().await?;

        self.emit_transition_events(order_id, current, target, ledger_events)
            .await;
        if target.is_cancelled() {
            self.event_sender.send(Event::OrderCancelled(order_id)).await;
        } else if target.is_terminal() {
            self.event_sender.send(Event::OrderCompleted(order_id)).await;
        }
        self.get_order(order_id).await
    }

    /// Legal only from the pre-completion status (`PUTAWAY` inbound,
    /// `LOADED` outbound). Commits accepted quantities into the ledger
    /// (inbound) or releases the picked stock (outbound), then moves the
    /// order into its terminal status, all in one transaction.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn complete(&self, order_id: Uuid) -> Result<OrderDetails, ServiceError> {
        let txn = self.db.begin().await?;
        let order = self.load_order(&txn, order_id).await?;
        let (direction, current) = parsed_status(&order)?;

        if !current.is_pre_completion() {
            return Err(ServiceError::InvalidState(format!(
                "order {} is {}; completion requires PUTAWAY (inbound) or LOADED (outbound)",
                order.order_number, current
            )));
        }
        let target = current.successor().ok_or_else(|| {
            ServiceError::InternalError(format!("status {} has no successor", current))
        })?;

        let ledger_events = self.commit_lines_to_ledger(&txn, &order, direction).await?;
        self.swap_status(&txn, &order, target).await?;
        txn.commit().await?;

        self.emit_transition_events(order_id, current, target, ledger_events)
            .await;
        self.event_sender.send(Event::OrderCompleted(order_id)).await;
        self.get_order(order_id).await
    }

    /// Cancels from any non-terminal status. Nothing has reached the
    /// ledger before completion, so there is nothing to revert.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel(&self, order_id: Uuid) -> Result<OrderDetails, ServiceError> {
        let txn = self.db.begin().await?;
        let order = self.load_order(&txn, order_id).await?;
        let (direction, current) = parsed_status(&order)?;

        let target = OrderStatus::cancelled(direction);
        if !current.can_transition_to(target) {
            return Err(ServiceError::InvalidTransition {
                from: current.to_string(),
                to: target.to_string(),
            });
        }

        self.swap_status(&txn, &order, target).await?;
        txn.commit().await?;

        self.emit_transition_events(order_id, current, target, Vec::new())
            .await;
        self.event_sender.send(Event::OrderCancelled(order_id)).await;
        self.get_order(order_id).await
    }

    /// Records actual handled quantities for a batch of lines. Legal only
    /// in the active-handling status (`RECEIVING` inbound,
    /// `PICKING`/`PACKING` outbound). The batch is validated as a whole
    /// before any line is written.
    #[instrument(skip(self, updates), fields(order_id = %order_id, updates = updates.len()))]
    pub async fn reconcile_lines(
        &self,
        order_id: Uuid,
        updates: Vec<ReconcileLineUpdate>,
    ) -> Result<OrderDetails, ServiceError> {
        let txn = self.db.begin().await?;
        let order = self.load_order(&txn, order_id).await?;
        let (_, current) = parsed_status(&order)?;

        if !current.is_active_handling() {
            return Err(ServiceError::InvalidState(format!(
                "order {} is {}; line reconciliation requires RECEIVING, PICKING or PACKING",
                order.order_number, current
            )));
        }

        let lines = self.load_lines(&txn, order_id).await?;
        let quantity_updates: Vec<reconciliation::QuantityUpdate> = updates
            .iter()
            .map(|u| reconciliation::QuantityUpdate {
                line_id: u.line_id,
                received_qty: u.received_qty,
                damaged_qty: u.damaged_qty,
            })
            .collect();
        let reconciled = reconciliation::reconcile(&lines, &quantity_updates)?;

        let now = Utc::now();
        for (update, outcome) in updates.iter().zip(reconciled.iter()) {
            let line = lines
                .iter()
                .find(|line| line.id == update.line_id)
                .ok_or_else(|| {
                    ServiceError::InternalError(format!("line {} vanished", update.line_id))
                })?;

            let mut active: order_line::ActiveModel = line.clone().into();
            active.received_qty = Set(Some(outcome.received_qty));
            active.damaged_qty = Set(Some(outcome.damaged_qty));
            active.accepted_qty = Set(Some(outcome.accepted_qty));
            if let Some(lot_number) = &update.lot_number {
                active.lot_number = Set(Some(lot_number.clone()));
            }
            if let Some(date) = update.manufacture_date {
                active.manufacture_date = Set(Some(date));
            }
            if let Some(date) = update.expiry_date {
                active.expiry_date = Set(Some(date));
            }
            if let Some(lot_id) = update.lot_id {
                active.lot_id = Set(Some(lot_id));
            }
            if let Some(location_id) = update.location_id {
                active.location_id = Set(Some(location_id));
            }
            active.updated_at = Set(Some(now));
            active.update(&txn).await?;
        }

        // Bump the order version so a racing transition or second
        // reconciliation serializes against this write.
        let res = order::Entity::update_many()
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .col_expr(order::Column::Version, Expr::value(order.version + 1))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Version.eq(order.version))
            .exec(&txn)
            .await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::ConcurrencyConflict(order_id));
        }

        txn.commit().await?;

        info!(order_id = %order_id, lines = updates.len(), "Order lines reconciled");
        self.event_sender
            .send(Event::OrderLinesReconciled {
                order_id,
                lines: updates.len(),
            })
            .await;
        self.get_order(order_id).await
    }

    async fn load_order(
        &self,
        txn: &DatabaseTransaction,
        order_id: Uuid,
    ) -> Result<order::Model, ServiceError> {
        order::Entity::find_by_id(order_id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    async fn load_lines<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
    ) -> Result<Vec<order_line::Model>, ServiceError> {
        Ok(order_line::Entity::find()
            .filter(order_line::Column::OrderId.eq(order_id))
            .order_by_asc(order_line::Column::LineNo)
            .all(conn)
            .await?)
    }

    /// Compare-and-swap on the status column: two racing transitions can
    /// never both succeed from the same source state.
    async fn swap_status(
        &self,
        txn: &DatabaseTransaction,
        order: &order::Model,
        target: OrderStatus,
    ) -> Result<(), ServiceError> {
        let res = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(target.to_string()))
            .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
            .col_expr(order::Column::Version, Expr::value(order.version + 1))
            .filter(order::Column::Id.eq(order.id))
            .filter(order::Column::Version.eq(order.version))
            .exec(txn)
            .await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::ConcurrencyConflict(order.id));
        }
        Ok(())
    }

    /// Commits reconciled lines into the ledger as part of completion.
    /// Inbound: every line with an accepted quantity becomes a lot placed
    /// at its recorded putaway location. Outbound: every picked line
    /// releases its stock from the recorded `(lot, location)` pair. Runs
    /// inside the completion transaction; any failure rolls the whole
    /// completion back.
    async fn commit_lines_to_ledger(
        &self,
        txn: &DatabaseTransaction,
        order: &order::Model,
        direction: OrderDirection,
    ) -> Result<Vec<Event>, ServiceError> {
        let lines = self.load_lines(txn, order.id).await?;
        let mut events = Vec::new();

        match direction {
            OrderDirection::Inbound => {
                for line in lines {
                    let accepted = line.accepted_qty.unwrap_or(0);
                    if accepted <= 0 {
                        continue;
                    }
                    let lot_number = line.lot_number.clone().ok_or_else(|| {
                        ServiceError::ValidationError(format!(
                            "line {} has accepted stock but no lot number recorded",
                            line.line_no
                        ))
                    })?;
                    let expiry_date = line.expiry_date.ok_or_else(|| {
                        ServiceError::ValidationError(format!(
                            "line {} has accepted stock but no expiry date recorded",
                            line.line_no
                        ))
                    })?;
                    let location_id = line.location_id.ok_or_else(|| {
                        ServiceError::ValidationError(format!(
                            "line {} has accepted stock but no putaway location recorded",
                            line.line_no
                        ))
                    })?;

                    let lot = self
                        .ledger
                        .create_lot_in(
                            txn,
                            &CreateLotInput {
                                sku: line.sku.clone(),
                                lot_number,
                                manufacture_date: line.manufacture_date,
                                expiry_date,
                                total_qty: accepted,
                                supplier: Some(order.counterparty_name.clone()),
                                origin_country: None,
                            },
                        )
                        .await?;
                    self.ledger.place_in(txn, lot.id, location_id, accepted).await?;

                    let mut active: order_line::ActiveModel = line.into();
                    active.lot_id = Set(Some(lot.id));
                    active.updated_at = Set(Some(Utc::now()));
                    active.update(txn).await?;

                    events.push(Event::LotCreated(lot.id));
                    events.push(Event::InventoryPlaced {
                        lot_id: lot.id,
                        location_id,
                        quantity: accepted,
                    });
                }
            }
            OrderDirection::Outbound => {
                for line in lines {
                    let picked = line.received_qty.unwrap_or(0);
                    if picked <= 0 {
                        continue;
                    }
                    let lot_id = line.lot_id.ok_or_else(|| {
                        ServiceError::ValidationError(format!(
                            "line {} was picked but no lot recorded",
                            line.line_no
                        ))
                    })?;
                    let location_id = line.location_id.ok_or_else(|| {
                        ServiceError::ValidationError(format!(
                            "line {} was picked but no location recorded",
                            line.line_no
                        ))
                    })?;

                    self.ledger.release_in(txn, lot_id, location_id, picked).await?;
                    events.push(Event::InventoryReleased {
                        lot_id,
                        location_id,
                        quantity: picked,
                    });
                }
            }
        }
        Ok(events)
    }

    async fn emit_transition_events(
        &self,
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        ledger_events: Vec<Event>,
    ) {
        self.event_sender
            .send(Event::OrderStatusChanged {
                order_id,
                old_status: from.to_string(),
                new_status: to.to_string(),
            })
            .await;
        for event in ledger_events {
            self.event_sender.send(event).await;
        }
    }
}

fn next_order_number(direction: OrderDirection) -> String {
    let prefix = match direction {
        OrderDirection::Inbound => "IB",
        OrderDirection::Outbound => "OB",
    };
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, id[..10].to_uppercase())
}

fn parsed_status(order: &order::Model) -> Result<(OrderDirection, OrderStatus), ServiceError> {
    let direction = order.direction().ok_or_else(|| {
        ServiceError::InternalError(format!(
            "order {} has unrecognized direction '{}'",
            order.id, order.direction
        ))
    })?;
    let status = order.status().ok_or_else(|| {
        ServiceError::InternalError(format!(
            "order {} has unrecognized status '{}'",
            order.id, order.status
        ))
    })?;
    Ok((direction, status))
}

/// Validates a status filter string against the canonical enums so list
/// queries never compare against arbitrary display strings.
fn parse_status_filter(
    direction: Option<OrderDirection>,
    raw: &str,
) -> Result<OrderStatus, ServiceError> {
    let parsed = match direction {
        Some(direction) => OrderStatus::parse(direction, raw),
        None => raw
            .parse::<InboundStatus>()
            .ok()
            .map(OrderStatus::Inbound)
            .or_else(|| raw.parse::<OutboundStatus>().ok().map(OrderStatus::Outbound)),
    };
    parsed.ok_or_else(|| {
        ServiceError::ValidationError(format!("'{}' is not a recognized order status", raw))
    })
}
