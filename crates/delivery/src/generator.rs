//! Delivery note store contract and the issuance workflow.

use std::sync::Arc;

use tracing::{info, instrument};

use greengrocer_core::{Clock, DomainError, DomainResult, IdSource};
use greengrocer_orders::{OrderId, OrderManager, OrderStatus};

use crate::note::{self, DeliveryNote, DeliveryNoteId, DeliveryReceipt};

/// Persistence contract for delivery notes.
///
/// `save` must reject (Conflict) a note whose order already has a different
/// note — the at-most-one-note-per-order invariant is enforced here, not just
/// pre-checked by the generator, so it holds under concurrent issuance.
pub trait DeliveryNoteStore: Send + Sync {
    fn find_all(&self) -> Vec<DeliveryNote>;
    fn find_by_id(&self, id: DeliveryNoteId) -> Option<DeliveryNote>;
    fn find_matching(&self, pred: &dyn Fn(&DeliveryNote) -> bool) -> Vec<DeliveryNote>;
    fn find_by_order(&self, order_id: OrderId) -> Option<DeliveryNote>;
    fn exists(&self, id: DeliveryNoteId) -> bool;
    fn save(&self, note: DeliveryNote) -> DomainResult<DeliveryNote>;
    fn delete(&self, id: DeliveryNoteId) -> bool;
}

/// Issues delivery notes against orders and confirms deliveries, driving the
/// order through its lifecycle via the [`OrderManager`].
pub struct DeliveryNoteGenerator {
    notes: Arc<dyn DeliveryNoteStore>,
    orders: Arc<OrderManager>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
}

impl DeliveryNoteGenerator {
    pub fn new(
        notes: Arc<dyn DeliveryNoteStore>,
        orders: Arc<OrderManager>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdSource>,
    ) -> Self {
        Self {
            notes,
            orders,
            clock,
            ids,
        }
    }

    /// Issue a delivery note against an order.
    ///
    /// Fails with Conflict when the order already has a note, Not-Found when
    /// the order does not exist, and Invalid-State unless the order is in
    /// preparation or shipped. On success an in-preparation order advances to
    /// shipped.
    #[instrument(skip(self), fields(order_id = %order_id), err)]
    pub fn generate(&self, order_id: OrderId, number: u64) -> DomainResult<DeliveryNote> {
        if self.notes.find_by_order(order_id).is_some() {
            return Err(DomainError::conflict(format!(
                "order {order_id} already has an associated delivery note"
            )));
        }

        let order = self.orders.find_by_id(order_id)?;

        if !matches!(
            order.status,
            OrderStatus::InPreparation | OrderStatus::Shipped
        ) {
            return Err(DomainError::invalid_state(format!(
                "cannot issue a delivery note for order {order_id} in status {}",
                order.status
            )));
        }

        let note = DeliveryNote {
            id: DeliveryNoteId::generate(self.ids.as_ref()),
            number,
            order_id,
            total_value: order.lines_total(),
            issued_at: self.clock.now(),
            receipt: None,
        };
        let note = self.notes.save(note)?;

        if order.status == OrderStatus::InPreparation {
            self.orders.change_status(order_id, OrderStatus::Shipped)?;
        }

        info!(note_id = %note.id, "delivery note issued");
        Ok(note)
    }

    /// Confirm the handover of a delivered order.
    ///
    /// Advances the order to `Delivered` unless it already is (which also
    /// marks its note flag), records the receipt on the note and re-saves it.
    /// Safe to repeat; the latest receipt wins.
    #[instrument(skip(self, receipt), fields(note_id = %note_id), err)]
    pub fn confirm_delivery(
        &self,
        note_id: DeliveryNoteId,
        receipt: DeliveryReceipt,
    ) -> DomainResult<DeliveryNote> {
        let mut note = self
            .notes
            .find_by_id(note_id)
            .ok_or_else(|| DomainError::not_found(format!("delivery note {note_id}")))?;

        let order = self.orders.find_by_id(note.order_id)?;
        if order.status != OrderStatus::Delivered {
            self.orders
                .change_status(note.order_id, OrderStatus::Delivered)?;
        }

        note.receipt = Some(receipt);
        self.notes.save(note)
    }

    pub fn find_all(&self) -> Vec<DeliveryNote> {
        self.notes.find_all()
    }

    pub fn find_by_id(&self, id: DeliveryNoteId) -> DomainResult<DeliveryNote> {
        self.notes
            .find_by_id(id)
            .ok_or_else(|| DomainError::not_found(format!("delivery note {id}")))
    }

    pub fn find_by_order(&self, order_id: OrderId) -> Option<DeliveryNote> {
        self.notes.find_by_order(order_id)
    }

    /// List delivery notes matching a criteria-filter string.
    pub fn find_by_criteria(&self, search: Option<&str>) -> DomainResult<Vec<DeliveryNote>> {
        let pred = note::schema().compile(search)?;
        Ok(self.notes.find_matching(&|n| pred.matches(n)))
    }

    #[instrument(skip(self), fields(note_id = %id), err)]
    pub fn delete(&self, id: DeliveryNoteId) -> DomainResult<()> {
        if !self.notes.delete(id) {
            return Err(DomainError::not_found(format!(
                "delivery note {id} not found for deletion"
            )));
        }
        Ok(())
    }
}
