//! `greengrocer-delivery` — delivery notes (waybills) and their generator.
//!
//! A delivery note is issued at most once per order, only while the order is
//! in preparation or already shipped, and carries the order's line total at
//! issuance time. Confirming delivery drives the order to `Delivered`.

pub mod generator;
pub mod note;

pub use generator::{DeliveryNoteGenerator, DeliveryNoteStore};
pub use note::{DeliveryNote, DeliveryNoteId, DeliveryReceipt};
