//! `greengrocer-store` — in-memory entity stores.
//!
//! Reference implementation of the store contracts, intended for tests/dev.
//! Not optimized for performance. The delivery-note store enforces the
//! one-note-per-order uniqueness constraint at save time, independently of
//! the generator's pre-check.

mod in_memory;

pub use in_memory::{
    InMemoryCustomerStore, InMemoryDeliveryNoteStore, InMemoryOrderStore, InMemoryProductStore,
};
