use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use greengrocer_core::{Entity, entity_id};
use greengrocer_filter::Schema;
use greengrocer_orders::OrderId;

entity_id!(
    /// Delivery note identifier.
    DeliveryNoteId
);

/// Handover details captured when a delivery is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Name of the person who received the goods.
    pub received_by: String,
    /// Identity document presented by the receiver, if any.
    pub id_document: Option<String>,
    pub remarks: Option<String>,
}

/// The document issued once per order, evidencing handover to logistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryNote {
    pub id: DeliveryNoteId,
    /// Human-facing note number, supplied by the caller at issuance.
    pub number: u64,
    /// The single order this note is issued against (one note per order).
    pub order_id: OrderId,
    /// Sum of the order's line subtotals at issuance time, half-up, 2 dp.
    pub total_value: Decimal,
    pub issued_at: DateTime<Utc>,
    /// Present once the delivery has been confirmed.
    pub receipt: Option<DeliveryReceipt>,
}

impl Entity for DeliveryNote {
    type Id = DeliveryNoteId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Filterable fields for list queries.
pub fn schema() -> Schema<DeliveryNote> {
    Schema::new("delivery note")
        .unsigned("number", |n: &DeliveryNote| n.number)
        .number("total_value", |n: &DeliveryNote| n.total_value)
        .opt_text("received_by", |n: &DeliveryNote| {
            n.receipt.as_ref().map(|r| r.received_by.clone())
        })
}
