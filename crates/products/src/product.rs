use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use greengrocer_core::{Entity, entity_id};
use greengrocer_filter::Schema;

entity_id!(
    /// Product identifier.
    ProductId
);

/// A catalog item: name, unit of measure, unit sale price. Leaf record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit of measure the price refers to (e.g. "kg", "unit", "crate").
    pub unit: String,
    pub unit_price: Decimal,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating (no id) or updating (id present) a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub id: Option<ProductId>,
    pub name: String,
    pub unit: String,
    pub unit_price: Decimal,
}

/// Filterable fields for list queries.
pub fn schema() -> Schema<Product> {
    Schema::new("product")
        .text("name", |p: &Product| p.name.clone())
        .text("unit", |p: &Product| p.unit.clone())
        .number("unit_price", |p: &Product| p.unit_price)
}
