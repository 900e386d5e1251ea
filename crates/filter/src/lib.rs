//! `greengrocer-filter` — the criteria-filter mini-language.
//!
//! List operations accept a compact textual filter like
//! `name:lettuce,unit_price>2`. The string is a comma-terminated sequence of
//! `field<op>value` clauses where `<op>` is `:` (match), `<` (upper bound,
//! inclusive) or `>` (lower bound, inclusive). Field and value tokens are
//! word characters only; clauses AND-combine; an empty string matches every
//! record.
//!
//! Each filterable record kind declares a [`Schema`] — a whitelist mapping
//! field names to typed accessors. Compilation resolves every clause against
//! the schema, coercing the value token to the field's kind, and fails fast
//! on unknown fields, malformed clauses, or uncoercible tokens.

mod clause;
mod schema;

pub use clause::{Clause, FilterOp, scan};
pub use schema::{Predicate, Schema};
