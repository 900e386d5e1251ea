//! Order store contract and the lifecycle manager.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{instrument, warn};

use greengrocer_core::{Clock, DomainError, DomainResult, IdSource, money};
use greengrocer_customers::{CustomerId, CustomerStore};
use greengrocer_products::ProductStore;

use crate::order::{self, LineSpec, Order, OrderDraft, OrderId, OrderLine, OrderStatus};

/// Persistence contract for orders. Lines travel inside the order record.
pub trait OrderStore: Send + Sync {
    fn find_all(&self) -> Vec<Order>;
    fn find_by_id(&self, id: OrderId) -> Option<Order>;
    fn find_matching(&self, pred: &dyn Fn(&Order) -> bool) -> Vec<Order>;
    fn find_by_customer(&self, customer_id: CustomerId) -> Vec<Order>;
    fn find_by_status(&self, status: OrderStatus) -> Vec<Order>;
    fn exists(&self, id: OrderId) -> bool;
    fn save(&self, order: Order) -> Order;
    fn delete(&self, id: OrderId) -> bool;
}

/// Owns order creation/update, total recomputation, and status transitions.
pub struct OrderManager {
    orders: Arc<dyn OrderStore>,
    customers: Arc<dyn CustomerStore>,
    products: Arc<dyn ProductStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
}

impl OrderManager {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        customers: Arc<dyn CustomerStore>,
        products: Arc<dyn ProductStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdSource>,
    ) -> Self {
        Self {
            orders,
            customers,
            products,
            clock,
            ids,
        }
    }

    /// Create or update an order.
    ///
    /// The customer reference must resolve. When lines are supplied, each
    /// line's product must resolve, quantity and unit price must be positive,
    /// and the total is recomputed from the lines — a caller-supplied total
    /// is overwritten. An update without lines keeps the stored lines and
    /// total untouched.
    #[instrument(skip(self, draft), fields(customer_id = %draft.customer_id), err)]
    pub fn save(&self, draft: OrderDraft) -> DomainResult<Order> {
        if !self.customers.exists(draft.customer_id) {
            return Err(DomainError::validation(format!(
                "customer {} does not exist",
                draft.customer_id
            )));
        }

        let existing = match draft.id {
            Some(id) => Some(
                self.orders
                    .find_by_id(id)
                    .ok_or_else(|| DomainError::not_found(format!("order {id}")))?,
            ),
            None => None,
        };

        let (lines, total_amount) = match draft.lines {
            Some(specs) => {
                let lines = self.resolve_lines(specs)?;
                let total = money::total_amount(lines.iter().map(OrderLine::subtotal));
                (lines, total)
            }
            None => match &existing {
                Some(order) => (order.lines.clone(), order.total_amount),
                None => (Vec::new(), draft.total_amount.unwrap_or(Decimal::ZERO)),
            },
        };

        let order = Order {
            id: existing
                .as_ref()
                .map(|o| o.id)
                .unwrap_or_else(|| OrderId::generate(self.ids.as_ref())),
            created_at: draft
                .created_at
                .or(existing.as_ref().map(|o| o.created_at))
                .unwrap_or_else(|| self.clock.now()),
            customer_id: draft.customer_id,
            status: draft
                .status
                .or(existing.as_ref().map(|o| o.status))
                .unwrap_or(OrderStatus::Pending),
            delivery_note_issued: draft
                .delivery_note_issued
                .or(existing.as_ref().map(|o| o.delivery_note_issued))
                .unwrap_or(false),
            lines,
            total_amount,
        };

        Ok(self.orders.save(order))
    }

    fn resolve_lines(&self, specs: Vec<LineSpec>) -> DomainResult<Vec<OrderLine>> {
        let mut lines = Vec::with_capacity(specs.len());
        for (idx, spec) in specs.into_iter().enumerate() {
            let line_no = (idx + 1) as u32;
            if !self.products.exists(spec.product_id) {
                return Err(DomainError::validation(format!(
                    "product {} on line {line_no} does not exist",
                    spec.product_id
                )));
            }
            if spec.quantity <= Decimal::ZERO {
                return Err(DomainError::validation(format!(
                    "quantity on line {line_no} must be positive"
                )));
            }
            if spec.unit_price <= Decimal::ZERO {
                return Err(DomainError::validation(format!(
                    "unit price on line {line_no} must be positive"
                )));
            }
            lines.push(OrderLine {
                line_no,
                product_id: spec.product_id,
                quantity: spec.quantity,
                unit_price: spec.unit_price,
            });
        }
        Ok(lines)
    }

    /// Overwrite an order's status.
    ///
    /// No legality check is enforced here: callers with business rules (the
    /// delivery-note workflow) restrict transitions themselves. An
    /// out-of-table transition is logged so the relaxation stays observable.
    /// Reaching `Delivered` also marks the delivery note as issued.
    #[instrument(skip(self), fields(order_id = %order_id, status = %status), err)]
    pub fn change_status(&self, order_id: OrderId, status: OrderStatus) -> DomainResult<Order> {
        let mut order = self
            .orders
            .find_by_id(order_id)
            .ok_or_else(|| DomainError::not_found(format!("order {order_id}")))?;

        if order.status != status && !order.status.can_transition(status) {
            warn!(
                from = %order.status,
                to = %status,
                "order status overwritten outside the transition table"
            );
        }

        order.status = status;
        if status == OrderStatus::Delivered {
            order.delivery_note_issued = true;
        }
        Ok(self.orders.save(order))
    }

    pub fn find_all(&self) -> Vec<Order> {
        self.orders.find_all()
    }

    pub fn find_by_id(&self, id: OrderId) -> DomainResult<Order> {
        self.orders
            .find_by_id(id)
            .ok_or_else(|| DomainError::not_found(format!("order {id}")))
    }

    pub fn find_by_customer(&self, customer_id: CustomerId) -> Vec<Order> {
        self.orders.find_by_customer(customer_id)
    }

    pub fn find_by_status(&self, status: OrderStatus) -> Vec<Order> {
        self.orders.find_by_status(status)
    }

    /// List orders matching a criteria-filter string.
    pub fn find_by_criteria(&self, search: Option<&str>) -> DomainResult<Vec<Order>> {
        let pred = order::schema().compile(search)?;
        Ok(self.orders.find_matching(&|o| pred.matches(o)))
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    pub fn delete(&self, id: OrderId) -> DomainResult<()> {
        if !self.orders.delete(id) {
            return Err(DomainError::not_found(format!(
                "order {id} not found for deletion"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::{PoisonError, RwLock};

    use chrono::{DateTime, Utc};
    use rust_decimal_macros::dec;

    use greengrocer_core::{FixedClock, SequenceIdSource};
    use greengrocer_customers::{Customer, CustomerId};
    use greengrocer_products::{Product, ProductId};

    #[derive(Default)]
    struct MemOrders {
        rows: RwLock<HashMap<OrderId, Order>>,
    }

    impl OrderStore for MemOrders {
        fn find_all(&self) -> Vec<Order> {
            let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
            rows.values().cloned().collect()
        }

        fn find_by_id(&self, id: OrderId) -> Option<Order> {
            let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
            rows.get(&id).cloned()
        }

        fn find_matching(&self, pred: &dyn Fn(&Order) -> bool) -> Vec<Order> {
            let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
            rows.values().filter(|o| pred(o)).cloned().collect()
        }

        fn find_by_customer(&self, customer_id: CustomerId) -> Vec<Order> {
            self.find_matching(&|o| o.customer_id == customer_id)
        }

        fn find_by_status(&self, status: OrderStatus) -> Vec<Order> {
            self.find_matching(&|o| o.status == status)
        }

        fn exists(&self, id: OrderId) -> bool {
            let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
            rows.contains_key(&id)
        }

        fn save(&self, order: Order) -> Order {
            let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
            rows.insert(order.id, order.clone());
            order
        }

        fn delete(&self, id: OrderId) -> bool {
            let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
            rows.remove(&id).is_some()
        }
    }

    struct MemCustomers {
        rows: RwLock<HashMap<CustomerId, Customer>>,
    }

    impl CustomerStore for MemCustomers {
        fn find_all(&self) -> Vec<Customer> {
            let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
            rows.values().cloned().collect()
        }

        fn find_by_id(&self, id: CustomerId) -> Option<Customer> {
            let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
            rows.get(&id).cloned()
        }

        fn find_matching(&self, pred: &dyn Fn(&Customer) -> bool) -> Vec<Customer> {
            let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
            rows.values().filter(|c| pred(c)).cloned().collect()
        }

        fn exists(&self, id: CustomerId) -> bool {
            let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
            rows.contains_key(&id)
        }

        fn save(&self, customer: Customer) -> Customer {
            let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
            rows.insert(customer.id, customer.clone());
            customer
        }

        fn delete(&self, id: CustomerId) -> bool {
            let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
            rows.remove(&id).is_some()
        }
    }

    struct MemProducts {
        rows: RwLock<HashMap<ProductId, Product>>,
    }

    impl ProductStore for MemProducts {
        fn find_all(&self) -> Vec<Product> {
            let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
            rows.values().cloned().collect()
        }

        fn find_by_id(&self, id: ProductId) -> Option<Product> {
            let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
            rows.get(&id).cloned()
        }

        fn find_matching(&self, pred: &dyn Fn(&Product) -> bool) -> Vec<Product> {
            let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
            rows.values().filter(|p| pred(p)).cloned().collect()
        }

        fn exists(&self, id: ProductId) -> bool {
            let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
            rows.contains_key(&id)
        }

        fn save(&self, product: Product) -> Product {
            let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
            rows.insert(product.id, product.clone());
            product
        }

        fn delete(&self, id: ProductId) -> bool {
            let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
            rows.remove(&id).is_some()
        }
    }

    fn test_time() -> DateTime<Utc> {
        "2024-03-01T09:00:00Z".parse().unwrap()
    }

    struct Fixture {
        manager: OrderManager,
        customer: CustomerId,
        lettuce: ProductId,
        pumpkin: ProductId,
    }

    fn fixture() -> Fixture {
        let customer = Customer {
            id: CustomerId::from_uuid(uuid::Uuid::from_u128(100)),
            name: "Frutas del Sur".to_string(),
            phone: None,
            address: "Av. Siempreviva 742".to_string(),
            email: None,
            tax_id: "20123456789".to_string(),
        };
        let lettuce = Product {
            id: ProductId::from_uuid(uuid::Uuid::from_u128(200)),
            name: "Lettuce".to_string(),
            unit: "kg".to_string(),
            unit_price: dec!(10.005),
        };
        let pumpkin = Product {
            id: ProductId::from_uuid(uuid::Uuid::from_u128(201)),
            name: "Pumpkin".to_string(),
            unit: "unit".to_string(),
            unit_price: dec!(2.00),
        };

        let customers = MemCustomers {
            rows: RwLock::new(HashMap::from([(customer.id, customer.clone())])),
        };
        let products = MemProducts {
            rows: RwLock::new(HashMap::from([
                (lettuce.id, lettuce.clone()),
                (pumpkin.id, pumpkin.clone()),
            ])),
        };

        let manager = OrderManager::new(
            Arc::new(MemOrders::default()),
            Arc::new(customers),
            Arc::new(products),
            Arc::new(FixedClock(test_time())),
            Arc::new(SequenceIdSource::new()),
        );

        Fixture {
            manager,
            customer: customer.id,
            lettuce: lettuce.id,
            pumpkin: pumpkin.id,
        }
    }

    fn draft(fx: &Fixture, lines: Option<Vec<LineSpec>>) -> OrderDraft {
        OrderDraft {
            id: None,
            customer_id: fx.customer,
            created_at: None,
            status: None,
            delivery_note_issued: None,
            lines,
            total_amount: None,
        }
    }

    fn two_lines(fx: &Fixture) -> Vec<LineSpec> {
        vec![
            LineSpec {
                product_id: fx.lettuce,
                quantity: dec!(3),
                unit_price: dec!(10.005),
            },
            LineSpec {
                product_id: fx.pumpkin,
                quantity: dec!(1),
                unit_price: dec!(2.00),
            },
        ]
    }

    #[test]
    fn save_recomputes_total_half_up() {
        let fx = fixture();
        // 3 x 10.005 + 1 x 2.00 = 32.015 -> 32.02
        let order = fx.manager.save(draft(&fx, Some(two_lines(&fx)))).unwrap();
        assert_eq!(order.total_amount, dec!(32.02));
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].line_no, 1);
        assert_eq!(order.lines[1].line_no, 2);
    }

    #[test]
    fn save_overwrites_caller_supplied_total_when_lines_present() {
        let fx = fixture();
        let mut d = draft(&fx, Some(two_lines(&fx)));
        d.total_amount = Some(dec!(999.99));
        let order = fx.manager.save(d).unwrap();
        assert_eq!(order.total_amount, dec!(32.02));
    }

    #[test]
    fn save_defaults_status_flag_and_timestamp() {
        let fx = fixture();
        let order = fx.manager.save(draft(&fx, None)).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.delivery_note_issued);
        assert_eq!(order.created_at, test_time());
        assert_eq!(order.total_amount, Decimal::ZERO);
    }

    #[test]
    fn save_requires_resolvable_customer() {
        let fx = fixture();
        let mut d = draft(&fx, None);
        d.customer_id = CustomerId::from_uuid(uuid::Uuid::from_u128(999));
        let err = fx.manager.save(d).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("customer"), "{msg}"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn save_requires_resolvable_products() {
        let fx = fixture();
        let lines = vec![LineSpec {
            product_id: ProductId::from_uuid(uuid::Uuid::from_u128(999)),
            quantity: dec!(1),
            unit_price: dec!(1),
        }];
        let err = fx.manager.save(draft(&fx, Some(lines))).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("line 1"), "{msg}"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn save_rejects_non_positive_quantity_and_price() {
        let fx = fixture();
        let mut lines = two_lines(&fx);
        lines[0].quantity = Decimal::ZERO;
        assert!(fx.manager.save(draft(&fx, Some(lines))).is_err());

        let mut lines = two_lines(&fx);
        lines[1].unit_price = dec!(-2);
        assert!(fx.manager.save(draft(&fx, Some(lines))).is_err());
    }

    #[test]
    fn update_without_lines_keeps_lines_and_total() {
        let fx = fixture();
        let order = fx.manager.save(draft(&fx, Some(two_lines(&fx)))).unwrap();

        let mut update = draft(&fx, None);
        update.id = Some(order.id);
        update.status = Some(OrderStatus::InPreparation);
        let updated = fx.manager.save(update).unwrap();

        assert_eq!(updated.status, OrderStatus::InPreparation);
        assert_eq!(updated.lines, order.lines);
        assert_eq!(updated.total_amount, dec!(32.02));
        assert_eq!(updated.created_at, order.created_at);
    }

    #[test]
    fn update_with_unknown_id_is_not_found() {
        let fx = fixture();
        let mut d = draft(&fx, None);
        d.id = Some(OrderId::from_uuid(uuid::Uuid::from_u128(999)));
        assert!(matches!(
            fx.manager.save(d).unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[test]
    fn change_status_overwrites_unconditionally() {
        let fx = fixture();
        let order = fx.manager.save(draft(&fx, None)).unwrap();

        // Out-of-table jump is applied anyway (legality is the caller's
        // business); it is only logged.
        let updated = fx
            .manager
            .change_status(order.id, OrderStatus::Shipped)
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Shipped);
    }

    #[test]
    fn change_status_to_delivered_flips_note_flag() {
        let fx = fixture();
        let order = fx.manager.save(draft(&fx, None)).unwrap();
        let updated = fx
            .manager
            .change_status(order.id, OrderStatus::Delivered)
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Delivered);
        assert!(updated.delivery_note_issued);
    }

    #[test]
    fn change_status_on_missing_order_is_not_found() {
        let fx = fixture();
        let err = fx
            .manager
            .change_status(
                OrderId::from_uuid(uuid::Uuid::from_u128(999)),
                OrderStatus::Cancelled,
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn queries_by_customer_and_status() {
        let fx = fixture();
        let order = fx.manager.save(draft(&fx, None)).unwrap();
        fx.manager
            .change_status(order.id, OrderStatus::InPreparation)
            .unwrap();

        assert_eq!(fx.manager.find_by_customer(fx.customer).len(), 1);
        assert_eq!(
            fx.manager.find_by_status(OrderStatus::InPreparation).len(),
            1
        );
        assert!(fx.manager.find_by_status(OrderStatus::Pending).is_empty());
    }

    #[test]
    fn criteria_filters_status_total_and_flag() {
        let fx = fixture();
        let order = fx.manager.save(draft(&fx, Some(two_lines(&fx)))).unwrap();
        fx.manager.save(draft(&fx, None)).unwrap();

        let hits = fx
            .manager
            .find_by_criteria(Some("total_amount>32,status:PENDING"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, order.id);

        let none = fx
            .manager
            .find_by_criteria(Some("delivery_note_issued:true"))
            .unwrap();
        assert!(none.is_empty());

        assert!(fx.manager.find_by_criteria(Some("status:ENROUTE")).is_err());
    }

    #[test]
    fn empty_criteria_returns_everything() {
        let fx = fixture();
        fx.manager.save(draft(&fx, None)).unwrap();
        fx.manager.save(draft(&fx, None)).unwrap();
        assert_eq!(fx.manager.find_by_criteria(Some("")).unwrap().len(), 2);
        assert_eq!(fx.manager.find_by_criteria(None).unwrap().len(), 2);
    }

    #[test]
    fn delete_missing_order_is_not_found() {
        let fx = fixture();
        let err = fx
            .manager
            .delete(OrderId::from_uuid(uuid::Uuid::from_u128(999)))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn qty_price() -> impl Strategy<Value = (Decimal, Decimal)> {
            // Quantities up to 100.00, prices up to 100.000, both positive.
            ((1i64..=10_000), (1i64..=100_000))
                .prop_map(|(q, p)| (Decimal::new(q, 2), Decimal::new(p, 3)))
        }

        proptest! {
            /// The persisted total always equals the half-up-rounded sum of
            /// the line subtotals.
            #[test]
            fn total_invariant_holds(specs in proptest::collection::vec(qty_price(), 1..6)) {
                let fx = fixture();
                let lines: Vec<LineSpec> = specs
                    .iter()
                    .map(|(quantity, unit_price)| LineSpec {
                        product_id: fx.lettuce,
                        quantity: *quantity,
                        unit_price: *unit_price,
                    })
                    .collect();

                let exact: Decimal = lines
                    .iter()
                    .map(|l| l.quantity * l.unit_price)
                    .sum();
                let order = fx.manager.save(draft(&fx, Some(lines))).unwrap();
                prop_assert_eq!(order.total_amount, money::round_half_up(exact));
                prop_assert_eq!(order.total_amount, order.lines_total());
            }
        }
    }
}
