use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use greengrocer_core::{DomainError, DomainResult, Entity};
use greengrocer_customers::{Customer, CustomerId, CustomerStore};
use greengrocer_delivery::{DeliveryNote, DeliveryNoteId, DeliveryNoteStore};
use greengrocer_orders::{Order, OrderId, OrderStatus, OrderStore};
use greengrocer_products::{Product, ProductId, ProductStore};

/// One locked table of records keyed by their entity id.
///
/// A poisoned lock is recovered rather than propagated: the tables hold
/// plain data and a panicking writer cannot leave a row half-written.
#[derive(Debug)]
struct Table<V: Entity> {
    rows: RwLock<HashMap<V::Id, V>>,
}

// Manual impl: the derived one would bound V on Default.
impl<V: Entity> Default for Table<V> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Entity + Clone> Table<V> {
    fn read(&self) -> RwLockReadGuard<'_, HashMap<V::Id, V>> {
        self.rows.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<V::Id, V>> {
        self.rows.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn all(&self) -> Vec<V> {
        self.read().values().cloned().collect()
    }

    fn get(&self, id: &V::Id) -> Option<V> {
        self.read().get(id).cloned()
    }

    fn filter(&self, pred: &dyn Fn(&V) -> bool) -> Vec<V> {
        self.read().values().filter(|v| pred(v)).cloned().collect()
    }

    fn contains(&self, id: &V::Id) -> bool {
        self.read().contains_key(id)
    }

    fn upsert(&self, value: V) -> V {
        self.write().insert(value.id().clone(), value.clone());
        value
    }

    fn remove(&self, id: &V::Id) -> bool {
        self.write().remove(id).is_some()
    }
}

/// In-memory customer store.
#[derive(Debug, Default)]
pub struct InMemoryCustomerStore {
    table: Table<Customer>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CustomerStore for InMemoryCustomerStore {
    fn find_all(&self) -> Vec<Customer> {
        self.table.all()
    }

    fn find_by_id(&self, id: CustomerId) -> Option<Customer> {
        self.table.get(&id)
    }

    fn find_matching(&self, pred: &dyn Fn(&Customer) -> bool) -> Vec<Customer> {
        self.table.filter(pred)
    }

    fn exists(&self, id: CustomerId) -> bool {
        self.table.contains(&id)
    }

    fn save(&self, customer: Customer) -> Customer {
        self.table.upsert(customer)
    }

    fn delete(&self, id: CustomerId) -> bool {
        self.table.remove(&id)
    }
}

/// In-memory product store.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    table: Table<Product>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductStore for InMemoryProductStore {
    fn find_all(&self) -> Vec<Product> {
        self.table.all()
    }

    fn find_by_id(&self, id: ProductId) -> Option<Product> {
        self.table.get(&id)
    }

    fn find_matching(&self, pred: &dyn Fn(&Product) -> bool) -> Vec<Product> {
        self.table.filter(pred)
    }

    fn exists(&self, id: ProductId) -> bool {
        self.table.contains(&id)
    }

    fn save(&self, product: Product) -> Product {
        self.table.upsert(product)
    }

    fn delete(&self, id: ProductId) -> bool {
        self.table.remove(&id)
    }
}

/// In-memory order store. Lines travel inside the order row, so deleting an
/// order drops its lines with it.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    table: Table<Order>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn find_all(&self) -> Vec<Order> {
        self.table.all()
    }

    fn find_by_id(&self, id: OrderId) -> Option<Order> {
        self.table.get(&id)
    }

    fn find_matching(&self, pred: &dyn Fn(&Order) -> bool) -> Vec<Order> {
        self.table.filter(pred)
    }

    fn find_by_customer(&self, customer_id: CustomerId) -> Vec<Order> {
        self.table.filter(&|o| o.customer_id == customer_id)
    }

    fn find_by_status(&self, status: OrderStatus) -> Vec<Order> {
        self.table.filter(&|o| o.status == status)
    }

    fn exists(&self, id: OrderId) -> bool {
        self.table.contains(&id)
    }

    fn save(&self, order: Order) -> Order {
        self.table.upsert(order)
    }

    fn delete(&self, id: OrderId) -> bool {
        self.table.remove(&id)
    }
}

/// In-memory delivery note store with a hard uniqueness constraint on the
/// order reference.
#[derive(Debug, Default)]
pub struct InMemoryDeliveryNoteStore {
    table: Table<DeliveryNote>,
}

impl InMemoryDeliveryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeliveryNoteStore for InMemoryDeliveryNoteStore {
    fn find_all(&self) -> Vec<DeliveryNote> {
        self.table.all()
    }

    fn find_by_id(&self, id: DeliveryNoteId) -> Option<DeliveryNote> {
        self.table.get(&id)
    }

    fn find_matching(&self, pred: &dyn Fn(&DeliveryNote) -> bool) -> Vec<DeliveryNote> {
        self.table.filter(pred)
    }

    fn find_by_order(&self, order_id: OrderId) -> Option<DeliveryNote> {
        self.table
            .filter(&|n| n.order_id == order_id)
            .into_iter()
            .next()
    }

    fn exists(&self, id: DeliveryNoteId) -> bool {
        self.table.contains(&id)
    }

    fn save(&self, note: DeliveryNote) -> DomainResult<DeliveryNote> {
        // The check and the insert happen under one write lock, so two
        // concurrent saves for the same order cannot both pass.
        let mut rows = self.table.write();
        if let Some(existing) = rows
            .values()
            .find(|n| n.order_id == note.order_id && n.id != note.id)
        {
            return Err(DomainError::conflict(format!(
                "order {} already has delivery note {}",
                note.order_id, existing.number
            )));
        }
        rows.insert(note.id, note.clone());
        Ok(note)
    }

    fn delete(&self, id: DeliveryNoteId) -> bool {
        self.table.remove(&id)
    }
}
