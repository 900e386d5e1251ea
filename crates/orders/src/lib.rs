//! `greengrocer-orders` — orders, their lines, and the lifecycle manager.
//!
//! An order owns its lines outright: lines live in a `Vec` on the order,
//! are addressed by 1-based position, and are dropped with it. Status moves
//! through `Pending → InPreparation → Shipped → Delivered`, with `Cancelled`
//! reachable from any non-terminal state; the legality table lives in
//! [`OrderStatus::can_transition`].

pub mod manager;
pub mod order;

pub use manager::{OrderManager, OrderStore};
pub use order::{LineSpec, Order, OrderDraft, OrderId, OrderLine, OrderStatus};
