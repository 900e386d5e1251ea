use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use greengrocer_core::{Entity, entity_id, money};
use greengrocer_customers::CustomerId;
use greengrocer_filter::Schema;
use greengrocer_products::ProductId;

entity_id!(
    /// Order identifier.
    OrderId
);

/// Order lifecycle status (wire-encoded as upper snake case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    InPreparation,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InPreparation => "IN_PREPARATION",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parse the wire spelling.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "PENDING" => Some(Self::Pending),
            "IN_PREPARATION" => Some(Self::InPreparation),
            "SHIPPED" => Some(Self::Shipped),
            "DELIVERED" => Some(Self::Delivered),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// The single transition-legality table.
    ///
    /// Forward chain `Pending → InPreparation → Shipped → Delivered`, and
    /// `Cancelled` from any non-terminal state. Terminal states have no
    /// successors.
    pub fn can_transition(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Pending, InPreparation)
                | (InPreparation, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (InPreparation, Cancelled)
                | (Shipped, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One product/quantity/price entry belonging to exactly one order.
///
/// Lines are addressed by 1-based position within their order and carry no
/// identity of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl OrderLine {
    pub fn subtotal(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

/// A customer's requested set of product lines with a computed total and a
/// lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    /// Whether a delivery note has been issued for this order. Flipped when
    /// the order reaches `Delivered`, independent of note existence.
    pub delivery_note_issued: bool,
    pub lines: Vec<OrderLine>,
    pub total_amount: Decimal,
}

impl Order {
    /// Sum of the line subtotals, rounded half-up to two decimals.
    pub fn lines_total(&self) -> Decimal {
        money::total_amount(self.lines.iter().map(OrderLine::subtotal))
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// One line of an order draft: the product reference plus quantity and the
/// unit price agreed for this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpec {
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// Input for creating (no id) or updating (id present) an order.
///
/// When `lines` is present the total is recomputed from them and any
/// caller-supplied `total_amount` is overwritten; when absent on an update,
/// the stored lines and total are retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub id: Option<OrderId>,
    pub customer_id: CustomerId,
    pub created_at: Option<DateTime<Utc>>,
    pub status: Option<OrderStatus>,
    pub delivery_note_issued: Option<bool>,
    pub lines: Option<Vec<LineSpec>>,
    pub total_amount: Option<Decimal>,
}

/// Filterable fields for list queries.
pub fn schema() -> Schema<Order> {
    Schema::new("order")
        .keyword(
            "status",
            |o: &Order| o.status.as_str(),
            |token| OrderStatus::parse(token).map(OrderStatus::as_str),
        )
        .number("total_amount", |o: &Order| o.total_amount)
        .boolean("delivery_note_issued", |o: &Order| o.delivery_note_issued)
}
