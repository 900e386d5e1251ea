use serde::{Deserialize, Serialize};

use greengrocer_core::{Entity, entity_id};
use greengrocer_filter::Schema;

entity_id!(
    /// Customer identifier.
    CustomerId
);

/// A buyer: legal/display name plus contact and fiscal details.
///
/// No lifecycle logic beyond create/update/delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    /// Legal or display name.
    pub name: String,
    pub phone: Option<String>,
    /// Delivery address.
    pub address: String,
    pub email: Option<String>,
    /// Fiscal identifier (CUIT/DNI or equivalent).
    pub tax_id: String,
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating (no id) or updating (id present) a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDraft {
    pub id: Option<CustomerId>,
    pub name: String,
    pub phone: Option<String>,
    pub address: String,
    pub email: Option<String>,
    pub tax_id: String,
}

/// Filterable fields for list queries.
pub fn schema() -> Schema<Customer> {
    Schema::new("customer")
        .text("name", |c: &Customer| c.name.clone())
        .opt_text("phone", |c: &Customer| c.phone.clone())
        .text("address", |c: &Customer| c.address.clone())
        .opt_text("email", |c: &Customer| c.email.clone())
        .text("tax_id", |c: &Customer| c.tax_id.clone())
}
