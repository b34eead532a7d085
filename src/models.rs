//! Status and plan enums shared across entities, services, and handlers.
//!
//! All of these are persisted as their snake_case string form so the schema
//! stays readable and portable across SQLite and Postgres.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Aggregate status of an order.
///
/// `AtWorkshop` is a side branch: individual items can enter and leave the
/// workshop without moving the whole order until every item agrees.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pickup,
    InProgress,
    AtWorkshop,
    Ready,
    OutForDelivery,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Legal aggregate transitions. Same-status updates are allowed as no-ops,
    /// and `Cancelled` is reachable from any non-terminal state.
    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        if self == to {
            return true;
        }
        if to == Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, to),
            (Pickup, InProgress)
                | (InProgress, AtWorkshop)
                | (InProgress, Ready)
                | (AtWorkshop, Ready)
                | (AtWorkshop, InProgress)
                | (Ready, AtWorkshop)
                | (Ready, OutForDelivery)
                | (OutForDelivery, Completed)
        )
    }
}

/// Per-item status, finer grained than the parent order's.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderItemStatus {
    Received,
    InProgress,
    AtWorkshop,
    WorkshopReturned,
    Ready,
    Completed,
}

impl OrderItemStatus {
    /// Items may only be routed to a workshop from these states.
    pub fn workshop_eligible(self) -> bool {
        matches!(self, Self::Received | Self::InProgress | Self::Ready)
    }

    pub fn is_done(self) -> bool {
        matches!(self, Self::Ready | Self::Completed)
    }
}

/// Actions accepted by the single-item workshop update endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WorkshopAction {
    MarkReturned,
    MarkReady,
    ReturnToStore,
}

/// Derived from paid vs total, never set directly by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

/// Intake channel; decides the initial order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderChannel {
    /// Customer app or driver-scheduled pickup; order starts at `pickup`.
    PickupRequest,
    /// Counter intake at the store; order starts at `in_progress`.
    WalkIn,
}

impl OrderChannel {
    pub fn initial_status(self) -> OrderStatus {
        match self {
            Self::PickupRequest => OrderStatus::Pickup,
            Self::WalkIn => OrderStatus::InProgress,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlanType {
    Trial,
    Basic,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlanStatus {
    Active,
    Cancelled,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StockAdjustmentType {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvoiceStatus {
    Created,
    Paid,
    Failed,
    Refunded,
}

impl InvoiceStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Failed | Self::Refunded)
    }
}
