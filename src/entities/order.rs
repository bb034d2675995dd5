use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_number: String,
    pub direction: String,
    pub status: String,
    pub priority: String,
    pub counterparty_name: String,
    pub carrier: Option<String>,
    pub scheduled_time: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_line::Entity")]
    OrderLines,
}

impl Related<super::order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parses the stored direction column.
    pub fn direction(&self) -> Option<OrderDirection> {
        self.direction.parse().ok()
    }

    /// Parses the stored status column in the context of the order's direction.
    pub fn status(&self) -> Option<OrderStatus> {
        OrderStatus::parse(self.direction()?, &self.status)
    }
}

/// Whether an order moves goods into or out of the warehouse.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderDirection {
    Inbound,
    Outbound,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderPriority {
    High,
    Medium,
    Low,
}

/// Receiving workflow statuses, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundStatus {
    Pending,
    Scheduled,
    Receiving,
    Qc,
    Putaway,
    Completed,
    Cancelled,
}

/// Shipping workflow statuses, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundStatus {
    Released,
    Picking,
    Packing,
    Loaded,
    Shipped,
    Cancelled,
}

/// Order lifecycle status, tagged by direction so that each variant only
/// admits its own status set. The chains are strictly linear: every
/// non-terminal status has exactly one successor, and `CANCELLED` is the
/// only other reachable status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderStatus {
    Inbound(InboundStatus),
    Outbound(OutboundStatus),
}

impl OrderStatus {
    /// Status a freshly created order starts in.
    pub fn initial(direction: OrderDirection) -> Self {
        match direction {
            OrderDirection::Inbound => Self::Inbound(InboundStatus::Pending),
            OrderDirection::Outbound => Self::Outbound(OutboundStatus::Released),
        }
    }

    pub fn cancelled(direction: OrderDirection) -> Self {
        match direction {
            OrderDirection::Inbound => Self::Inbound(InboundStatus::Cancelled),
            OrderDirection::Outbound => Self::Outbound(OutboundStatus::Cancelled),
        }
    }

    /// Parses a wire/storage status string for the given direction.
    pub fn parse(direction: OrderDirection, raw: &str) -> Option<Self> {
        match direction {
            OrderDirection::Inbound => raw.parse::<InboundStatus>().ok().map(Self::Inbound),
            OrderDirection::Outbound => raw.parse::<OutboundStatus>().ok().map(Self::Outbound),
        }
    }

    pub fn direction(&self) -> OrderDirection {
        match self {
            Self::Inbound(_) => OrderDirection::Inbound,
            Self::Outbound(_) => OrderDirection::Outbound,
        }
    }

    /// The single designated next status in the chain, if any.
    pub fn successor(&self) -> Option<Self> {
        match self {
            Self::Inbound(s) => {
                use InboundStatus::*;
                let next = match s {
                    Pending => Some(Scheduled),
                    Scheduled => Some(Receiving),
                    Receiving => Some(Qc),
                    Qc => Some(Putaway),
                    Putaway => Some(Completed),
                    Completed | Cancelled => None,
                };
                next.map(Self::Inbound)
            }
            Self::Outbound(s) => {
                use OutboundStatus::*;
                let next = match s {
                    Released => Some(Picking),
                    Picking => Some(Packing),
                    Packing => Some(Loaded),
                    Loaded => Some(Shipped),
                    Shipped | Cancelled => None,
                };
                next.map(Self::Outbound)
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Inbound(InboundStatus::Completed)
                | Self::Inbound(InboundStatus::Cancelled)
                | Self::Outbound(OutboundStatus::Shipped)
                | Self::Outbound(OutboundStatus::Cancelled)
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Inbound(InboundStatus::Cancelled) | Self::Outbound(OutboundStatus::Cancelled)
        )
    }

    /// Whether quantity reconciliation is legal in this status.
    pub fn is_active_handling(&self) -> bool {
        matches!(
            self,
            Self::Inbound(InboundStatus::Receiving)
                | Self::Outbound(OutboundStatus::Picking)
                | Self::Outbound(OutboundStatus::Packing)
        )
    }

    /// Whether `complete` is legal from this status.
    pub fn is_pre_completion(&self) -> bool {
        matches!(
            self,
            Self::Inbound(InboundStatus::Putaway) | Self::Outbound(OutboundStatus::Loaded)
        )
    }

    /// Strict chain rule: the target must be the designated successor, or
    /// `CANCELLED` from any non-terminal status.
    pub fn can_transition_to(&self, target: Self) -> bool {
        if self.direction() != target.direction() {
            return false;
        }
        if target.is_cancelled() {
            return !self.is_terminal();
        }
        self.successor() == Some(target)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inbound(s) => s.fmt(f),
            Self::Outbound(s) => s.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_chain(start: OrderStatus) -> Vec<String> {
        let mut chain = vec![start.to_string()];
        let mut current = start;
        while let Some(next) = current.successor() {
            chain.push(next.to_string());
            current = next;
        }
        chain
    }

    #[test]
    fn inbound_chain_is_linear() {
        let chain = walk_chain(OrderStatus::initial(OrderDirection::Inbound));
        assert_eq!(
            chain,
            vec!["PENDING", "SCHEDULED", "RECEIVING", "QC", "PUTAWAY", "COMPLETED"]
        );
    }

    #[test]
    fn outbound_chain_is_linear() {
        let chain = walk_chain(OrderStatus::initial(OrderDirection::Outbound));
        assert_eq!(
            chain,
            vec!["RELEASED", "PICKING", "PACKING", "LOADED", "SHIPPED"]
        );
    }

    #[test]
    fn skipping_a_step_is_rejected() {
        let receiving = OrderStatus::Inbound(InboundStatus::Receiving);
        let putaway = OrderStatus::Inbound(InboundStatus::Putaway);
        assert!(!receiving.can_transition_to(putaway));
        assert!(receiving.can_transition_to(OrderStatus::Inbound(InboundStatus::Qc)));
    }

    #[test]
    fn backwards_transition_is_rejected() {
        let qc = OrderStatus::Inbound(InboundStatus::Qc);
        assert!(!qc.can_transition_to(OrderStatus::Inbound(InboundStatus::Receiving)));
        assert!(!qc.can_transition_to(qc));
    }

    #[test]
    fn cancel_is_reachable_from_any_non_terminal_status() {
        for status in [
            OrderStatus::Inbound(InboundStatus::Pending),
            OrderStatus::Inbound(InboundStatus::Scheduled),
            OrderStatus::Inbound(InboundStatus::Receiving),
            OrderStatus::Inbound(InboundStatus::Qc),
            OrderStatus::Inbound(InboundStatus::Putaway),
            OrderStatus::Outbound(OutboundStatus::Released),
            OrderStatus::Outbound(OutboundStatus::Picking),
            OrderStatus::Outbound(OutboundStatus::Packing),
            OrderStatus::Outbound(OutboundStatus::Loaded),
        ] {
            assert!(
                status.can_transition_to(OrderStatus::cancelled(status.direction())),
                "cancel should be legal from {status}"
            );
        }
    }

    #[test]
    fn terminal_statuses_reject_everything() {
        for terminal in [
            OrderStatus::Inbound(InboundStatus::Completed),
            OrderStatus::Inbound(InboundStatus::Cancelled),
            OrderStatus::Outbound(OutboundStatus::Shipped),
            OrderStatus::Outbound(OutboundStatus::Cancelled),
        ] {
            assert!(terminal.is_terminal());
            assert!(terminal.successor().is_none());
            assert!(!terminal.can_transition_to(OrderStatus::cancelled(terminal.direction())));
        }
    }

    #[test]
    fn directions_never_mix() {
        let receiving = OrderStatus::Inbound(InboundStatus::Receiving);
        assert!(!receiving.can_transition_to(OrderStatus::Outbound(OutboundStatus::Packing)));
        assert!(!receiving.can_transition_to(OrderStatus::cancelled(OrderDirection::Outbound)));
    }

    #[test]
    fn parse_is_direction_scoped() {
        assert_eq!(
            OrderStatus::parse(OrderDirection::Inbound, "QC"),
            Some(OrderStatus::Inbound(InboundStatus::Qc))
        );
        assert_eq!(OrderStatus::parse(OrderDirection::Outbound, "QC"), None);
        assert_eq!(OrderStatus::parse(OrderDirection::Inbound, "PICKING"), None);
        assert_eq!(OrderStatus::parse(OrderDirection::Inbound, "qc"), None);
    }

    #[test]
    fn display_round_trips_through_parse() {
        let status = OrderStatus::Outbound(OutboundStatus::Loaded);
        assert_eq!(
            OrderStatus::parse(OrderDirection::Outbound, &status.to_string()),
            Some(status)
        );
    }

    #[test]
    fn active_handling_statuses() {
        assert!(OrderStatus::Inbound(InboundStatus::Receiving).is_active_handling());
        assert!(OrderStatus::Outbound(OutboundStatus::Picking).is_active_handling());
        assert!(OrderStatus::Outbound(OutboundStatus::Packing).is_active_handling());
        assert!(!OrderStatus::Inbound(InboundStatus::Qc).is_active_handling());
        assert!(!OrderStatus::Outbound(OutboundStatus::Loaded).is_active_handling());
    }
}
