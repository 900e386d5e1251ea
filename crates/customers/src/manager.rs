//! Customer store contract and manager.

use std::sync::Arc;

use tracing::instrument;

use greengrocer_core::{DomainError, DomainResult, IdSource};

use crate::customer::{self, Customer, CustomerDraft, CustomerId};

/// Persistence contract for customers.
pub trait CustomerStore: Send + Sync {
    fn find_all(&self) -> Vec<Customer>;
    fn find_by_id(&self, id: CustomerId) -> Option<Customer>;
    fn find_matching(&self, pred: &dyn Fn(&Customer) -> bool) -> Vec<Customer>;
    fn exists(&self, id: CustomerId) -> bool;
    fn save(&self, customer: Customer) -> Customer;
    fn delete(&self, id: CustomerId) -> bool;
}

/// Create/update, query and delete customers.
pub struct CustomerManager {
    store: Arc<dyn CustomerStore>,
    ids: Arc<dyn IdSource>,
}

impl CustomerManager {
    pub fn new(store: Arc<dyn CustomerStore>, ids: Arc<dyn IdSource>) -> Self {
        Self { store, ids }
    }

    /// Create a customer (draft without id) or update an existing one.
    #[instrument(skip(self, draft), err)]
    pub fn save(&self, draft: CustomerDraft) -> DomainResult<Customer> {
        if draft.name.trim().is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }
        if draft.address.trim().is_empty() {
            return Err(DomainError::validation(
                "customer delivery address cannot be empty",
            ));
        }
        if draft.tax_id.trim().is_empty() {
            return Err(DomainError::validation("customer tax id cannot be empty"));
        }

        let id = match draft.id {
            Some(id) => {
                if !self.store.exists(id) {
                    return Err(DomainError::not_found(format!("customer {id}")));
                }
                id
            }
            None => CustomerId::generate(self.ids.as_ref()),
        };

        let customer = Customer {
            id,
            name: draft.name,
            phone: draft.phone,
            address: draft.address,
            email: draft.email,
            tax_id: draft.tax_id,
        };
        Ok(self.store.save(customer))
    }

    pub fn find_all(&self) -> Vec<Customer> {
        self.store.find_all()
    }

    pub fn find_by_id(&self, id: CustomerId) -> DomainResult<Customer> {
        self.store
            .find_by_id(id)
            .ok_or_else(|| DomainError::not_found(format!("customer {id}")))
    }

    /// List customers matching a criteria-filter string.
    pub fn find_by_criteria(&self, search: Option<&str>) -> DomainResult<Vec<Customer>> {
        let pred = customer::schema().compile(search)?;
        Ok(self.store.find_matching(&|c| pred.matches(c)))
    }

    #[instrument(skip(self), fields(customer_id = %id), err)]
    pub fn delete(&self, id: CustomerId) -> DomainResult<()> {
        if !self.store.delete(id) {
            return Err(DomainError::not_found(format!(
                "customer {id} not found for deletion"
            )));
        }
        Ok(())
    }
}
