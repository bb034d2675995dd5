//! Line reconciliation: recording actual handled quantities against what an
//! order requested.
//!
//! The engine is pure. It validates a whole batch of quantity updates
//! before producing any output, so a failing batch leaves nothing to
//! apply and callers can correct and resubmit without double-counting.
//! Completeness is not enforced: partial receipt and over-receipt are both
//! legal business outcomes, only internal consistency is checked.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::entities::order_line;
use crate::errors::ServiceError;

/// One quantity update against an order line. Outbound picks are the
/// degenerate case with `damaged_qty == 0`.
#[derive(Debug, Clone, Copy)]
pub struct QuantityUpdate {
    pub line_id: Uuid,
    pub received_qty: i32,
    pub damaged_qty: i32,
}

/// Per-line result of a validated batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciledLine {
    pub line_id: Uuid,
    pub received_qty: i32,
    pub damaged_qty: i32,
    pub accepted_qty: i32,
}

/// Order-level aggregates over the current state of all lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
pub struct OrderTotals {
    pub total_expected: i32,
    pub total_received: i32,
    pub total_damaged: i32,
    pub total_accepted: i32,
}

/// `accepted = max(received - damaged, 0)`; with the batch constraints
/// this means `accepted + damaged == received`.
pub fn accepted_qty(received_qty: i32, damaged_qty: i32) -> i32 {
    (received_qty - damaged_qty).max(0)
}

/// Validates a batch of updates against the order's lines and computes the
/// accepted quantity for each. Any violation rejects the whole batch with
/// an error naming the offending line; no partial result is returned.
pub fn reconcile(
    lines: &[order_line::Model],
    updates: &[QuantityUpdate],
) -> Result<Vec<ReconciledLine>, ServiceError> {
    if updates.is_empty() {
        return Err(ServiceError::ValidationError(
            "at least one line update is required".into(),
        ));
    }

    let known: HashMap<Uuid, &order_line::Model> =
        lines.iter().map(|line| (line.id, line)).collect();
    let mut seen: HashSet<Uuid> = HashSet::with_capacity(updates.len());
    let mut reconciled = Vec::with_capacity(updates.len());

    for update in updates {
        if !known.contains_key(&update.line_id) {
            return Err(ServiceError::ValidationError(format!(
                "line {} is not part of this order",
                update.line_id
            )));
        }
        if !seen.insert(update.line_id) {
            return Err(ServiceError::ValidationError(format!(
                "line {} appears more than once in the batch",
                update.line_id
            )));
        }
        if update.received_qty < 0 {
            return Err(ServiceError::ValidationError(format!(
                "line {}: received quantity must not be negative",
                update.line_id
            )));
        }
        if update.damaged_qty < 0 {
            return Err(ServiceError::ValidationError(format!(
                "line {}: damaged quantity must not be negative",
                update.line_id
            )));
        }
        if update.damaged_qty > update.received_qty {
            return Err(ServiceError::ValidationError(format!(
                "line {}: damaged quantity {} exceeds received quantity {}",
                update.line_id, update.damaged_qty, update.received_qty
            )));
        }

        reconciled.push(ReconciledLine {
            line_id: update.line_id,
            received_qty: update.received_qty,
            damaged_qty: update.damaged_qty,
            accepted_qty: accepted_qty(update.received_qty, update.damaged_qty),
        });
    }

    Ok(reconciled)
}

/// Aggregates the order totals from its lines as currently recorded.
/// Unreconciled lines contribute zero to everything but `total_expected`.
pub fn totals(lines: &[order_line::Model]) -> OrderTotals {
    lines.iter().fold(OrderTotals::default(), |acc, line| {
        OrderTotals {
            total_expected: acc.total_expected + line.expected_qty,
            total_received: acc.total_received + line.received_qty.unwrap_or(0),
            total_damaged: acc.total_damaged + line.damaged_qty.unwrap_or(0),
            total_accepted: acc.total_accepted + line.accepted_qty.unwrap_or(0),
        }
    })
}
