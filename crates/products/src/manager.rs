//! Product store contract and manager.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::instrument;

use greengrocer_core::{DomainError, DomainResult, IdSource};

use crate::product::{self, Product, ProductDraft, ProductId};

/// Persistence contract for products.
pub trait ProductStore: Send + Sync {
    fn find_all(&self) -> Vec<Product>;
    fn find_by_id(&self, id: ProductId) -> Option<Product>;
    fn find_matching(&self, pred: &dyn Fn(&Product) -> bool) -> Vec<Product>;
    fn exists(&self, id: ProductId) -> bool;
    fn save(&self, product: Product) -> Product;
    fn delete(&self, id: ProductId) -> bool;
}

/// Create/update, query and delete catalog products.
pub struct ProductManager {
    store: Arc<dyn ProductStore>,
    ids: Arc<dyn IdSource>,
}

impl ProductManager {
    pub fn new(store: Arc<dyn ProductStore>, ids: Arc<dyn IdSource>) -> Self {
        Self { store, ids }
    }

    /// Create a product (draft without id) or update an existing one.
    #[instrument(skip(self, draft), err)]
    pub fn save(&self, draft: ProductDraft) -> DomainResult<Product> {
        if draft.name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if draft.unit.trim().is_empty() {
            return Err(DomainError::validation(
                "product unit of measure cannot be empty",
            ));
        }
        if draft.unit_price <= Decimal::ZERO {
            return Err(DomainError::validation(
                "product unit price must be positive",
            ));
        }

        let id = match draft.id {
            Some(id) => {
                if !self.store.exists(id) {
                    return Err(DomainError::not_found(format!("product {id}")));
                }
                id
            }
            None => ProductId::generate(self.ids.as_ref()),
        };

        let product = Product {
            id,
            name: draft.name,
            unit: draft.unit,
            unit_price: draft.unit_price,
        };
        Ok(self.store.save(product))
    }

    pub fn find_all(&self) -> Vec<Product> {
        self.store.find_all()
    }

    pub fn find_by_id(&self, id: ProductId) -> DomainResult<Product> {
        self.store
            .find_by_id(id)
            .ok_or_else(|| DomainError::not_found(format!("product {id}")))
    }

    /// List products matching a criteria-filter string.
    pub fn find_by_criteria(&self, search: Option<&str>) -> DomainResult<Vec<Product>> {
        let pred = product::schema().compile(search)?;
        Ok(self.store.find_matching(&|p| pred.matches(p)))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    pub fn delete(&self, id: ProductId) -> DomainResult<()> {
        if !self.store.delete(id) {
            return Err(DomainError::not_found(format!(
                "product {id} not found for deletion"
            )));
        }
        Ok(())
    }
}
