//! Cross-table atomic compositions (spec.md §4.3/§4.4): the order-status
//! CAS and its Group-row counterpart must commit or fail together, and so
//! must the order insert and the stock deduction it depends on. Grounded
//! on `original_source/handlers/order.go`'s `handleRiderGrabOrder`, which
//! opens one `tx` and passes it straight into `insertGroup` rather than
//! running two independently-committed calls.
//!
//! This is a separate seam from `OrderStore`/`GroupStore`/`ProductStore`
//! on purpose: those model single-table CRUD and stay swappable for tests;
//! this trait models the "commit together or not at all" contract those
//! tables need when two of them move in the same business event.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::core_types::{Money, OrderId, ProductId, RiderId, ShopId, UserId};
use crate::group::model::Group;
use crate::group::store::GroupStore;
use crate::order::error::OrderError;
use crate::order::model::Order;
use crate::order::status::OrderStatus;
use crate::order::store::OrderStore;
use crate::product::error::StockError;
use crate::product::store::ProductStore;

#[async_trait]
pub trait OrderTransactions: Send + Sync {
    /// Regular (non-flash-sale) product path: deducts stock and inserts
    /// the order row together (spec.md §4.4 / invariant 4). Flash-sale
    /// products reserve against the cache script instead and never reach
    /// this method.
    async fn place_regular(
        &self,
        user_id: UserId,
        shop_id: ShopId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Money,
        delivery_fee: Money,
    ) -> Result<Order, OrderError>;

    /// `merchant_confirm`'s CAS plus the Group row it creates (spec.md
    /// §4.3 / invariant 3: `group_id` set iff `status >= merchant_confirmed`).
    async fn confirm_with_group(&self, order_id: OrderId, shop_id: ShopId) -> Result<(Order, Group), OrderError>;

    /// `rider_accept`'s CAS plus the Group row's `rider_id` attach.
    async fn accept_with_group(&self, order_id: OrderId, rider_id: RiderId) -> Result<(Order, Group), OrderError>;
}

pub struct PgOrderTransactions {
    pool: PgPool,
}

impl PgOrderTransactions {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_order(row: &sqlx::postgres::PgRow) -> Result<Order, OrderError> {
    let status_id: i16 = row.try_get("status")?;
    let status = OrderStatus::from_id(status_id)
        .ok_or_else(|| OrderError::TransientStorage(format!("unknown status id {status_id}")))?;
    Ok(Order {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        shop_id: row.try_get("shop_id")?,
        rider_id: row.try_get("rider_id")?,
        product_id: row.try_get("product_id")?,
        quantity: row.try_get("quantity")?,
        status,
        total_price: row.try_get("total_price")?,
        delivery_fee: row.try_get("delivery_fee")?,
        created_at: row.try_get("created_at")?,
        group_id: row.try_get("group_id")?,
    })
}

fn row_to_group(row: &sqlx::postgres::PgRow) -> Result<Group, OrderError> {
    Ok(Group {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        user_id: row.try_get("user_id")?,
        shop_id: row.try_get("shop_id")?,
        rider_id: row.try_get("rider_id")?,
    })
}

#[async_trait]
impl OrderTransactions for PgOrderTransactions {
    async fn place_regular(
        &self,
        user_id: UserId,
        shop_id: ShopId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Money,
        delivery_fee: Money,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $1")
            .bind(quantity)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(OrderError::OutOfStock(product_id));
        }

        let total_price = Order::compute_total(unit_price, quantity, delivery_fee);
        let row = sqlx::query(
            "INSERT INTO orders (user_id, shop_id, product_id, quantity, status, total_price, delivery_fee, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, now())
             RETURNING id, user_id, shop_id, rider_id, product_id, quantity, status, total_price, delivery_fee, created_at, group_id",
        )
        .bind(user_id)
        .bind(shop_id)
        .bind(product_id)
        .bind(quantity)
        .bind(OrderStatus::AwaitingMerchant.id())
        .bind(total_price)
        .bind(delivery_fee)
        .fetch_one(&mut *tx)
        .await?;

        let order = row_to_order(&row)?;
        tx.commit().await?;
        Ok(order)
    }

    async fn confirm_with_group(&self, order_id: OrderId, shop_id: ShopId) -> Result<(Order, Group), OrderError> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query("SELECT status, shop_id FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(locked) = locked else {
            return Err(OrderError::NotFound(order_id));
        };
        let current: i16 = locked.try_get("status")?;
        let row_shop_id: ShopId = locked.try_get("shop_id")?;
        if row_shop_id != shop_id {
            return Err(OrderError::OwnershipViolation { order_id, actor_id: shop_id });
        }
        if current != OrderStatus::AwaitingMerchant.id() {
            return Err(OrderError::Conflict(order_id));
        }

        let row = sqlx::query(
            "UPDATE orders SET status = $1 WHERE id = $2 AND status = $3
             RETURNING id, user_id, shop_id, rider_id, product_id, quantity, status, total_price, delivery_fee, created_at, group_id",
        )
        .bind(OrderStatus::MerchantConfirmed.id())
        .bind(order_id)
        .bind(OrderStatus::AwaitingMerchant.id())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Err(OrderError::Conflict(order_id));
        };
        let mut order = row_to_order(&row)?;

        let group_row = sqlx::query(
            "INSERT INTO groups (order_id, user_id, shop_id)
             VALUES ($1, $2, $3)
             ON CONFLICT (order_id) DO UPDATE SET order_id = EXCLUDED.order_id
             RETURNING id, order_id, user_id, shop_id, rider_id",
        )
        .bind(order_id)
        .bind(order.user_id)
        .bind(order.shop_id)
        .fetch_one(&mut *tx)
        .await?;
        let group = row_to_group(&group_row)?;

        sqlx::query("UPDATE orders SET group_id = $1 WHERE id = $2")
            .bind(group.id)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        order.group_id = Some(group.id);

        tx.commit().await?;
        Ok((order, group))
    }

    async fn accept_with_group(&self, order_id: OrderId, rider_id: RiderId) -> Result<(Order, Group), OrderError> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query("SELECT status, rider_id, group_id FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(locked) = locked else {
            return Err(OrderError::NotFound(order_id));
        };
        let current: i16 = locked.try_get("status")?;
        let existing_rider: Option<RiderId> = locked.try_get("rider_id")?;
        let group_id: Option<i64> = locked.try_get("group_id")?;
        if current != OrderStatus::DeliveryPublished.id() || existing_rider.is_some() {
            return Err(OrderError::Conflict(order_id));
        }
        let Some(group_id) = group_id else {
            return Err(OrderError::TransientStorage(format!(
                "order {order_id} has no group to attach rider to"
            )));
        };

        let row = sqlx::query(
            "UPDATE orders SET status = $1, rider_id = $2 WHERE id = $3 AND status = $4 AND rider_id IS NULL
             RETURNING id, user_id, shop_id, rider_id, product_id, quantity, status, total_price, delivery_fee, created_at, group_id",
        )
        .bind(OrderStatus::Assigned.id())
        .bind(rider_id)
        .bind(order_id)
        .bind(OrderStatus::DeliveryPublished.id())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Err(OrderError::Conflict(order_id));
        };
        let order = row_to_order(&row)?;

        let group_row = sqlx::query(
            "UPDATE groups SET rider_id = $1 WHERE id = $2
             RETURNING id, order_id, user_id, shop_id, rider_id",
        )
        .bind(rider_id)
        .bind(group_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(group_row) = group_row else {
            return Err(OrderError::TransientStorage(format!(
                "group {group_id} missing for order {order_id}"
            )));
        };
        let group = row_to_group(&group_row)?;

        tx.commit().await?;
        Ok((order, group))
    }
}

/// In-memory stand-in for unit tests. The fakes have no transaction of
/// their own, so "atomic" here means "no other call interleaves" rather
/// than a real commit/rollback boundary — enough to exercise
/// `OrderCoordinator`'s call sequence without live Postgres; the actual
/// commit-or-rollback guarantee is `PgOrderTransactions`'s to keep.
pub struct FakeOrderTransactions {
    orders: Arc<dyn OrderStore>,
    products: Arc<dyn ProductStore>,
    groups: Arc<dyn GroupStore>,
}

impl FakeOrderTransactions {
    pub fn new(orders: Arc<dyn OrderStore>, products: Arc<dyn ProductStore>, groups: Arc<dyn GroupStore>) -> Self {
        Self { orders, products, groups }
    }
}

#[async_trait]
impl OrderTransactions for FakeOrderTransactions {
    async fn place_regular(
        &self,
        user_id: UserId,
        shop_id: ShopId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Money,
        delivery_fee: Money,
    ) -> Result<Order, OrderError> {
        self.products.reserve(product_id, quantity).await.map_err(|err| match err {
            StockError::Insufficient { product_id, .. } => OrderError::OutOfStock(product_id),
            other => OrderError::TransientStorage(other.to_string()),
        })?;

        match self
            .orders
            .create(user_id, shop_id, product_id, quantity, unit_price, delivery_fee)
            .await
        {
            Ok(order) => Ok(order),
            Err(err) => {
                if let Err(release_err) = self.products.release(product_id, quantity).await {
                    tracing::error!(error = %release_err, "failed to release stock after failed order create");
                }
                Err(err)
            }
        }
    }

    async fn confirm_with_group(&self, order_id: OrderId, shop_id: ShopId) -> Result<(Order, Group), OrderError> {
        let order = self.orders.get(order_id).await?;
        if order.shop_id != shop_id {
            return Err(OrderError::OwnershipViolation { order_id, actor_id: shop_id });
        }

        let updated = self
            .orders
            .update_status_if(order_id, OrderStatus::AwaitingMerchant, OrderStatus::MerchantConfirmed)
            .await?;
        let group = self.groups.create_once(order_id, updated.user_id, updated.shop_id).await?;
        self.orders.set_group_id(order_id, group.id).await?;

        let mut with_group = updated;
        with_group.group_id = Some(group.id);
        Ok((with_group, group))
    }

    async fn accept_with_group(&self, order_id: OrderId, rider_id: RiderId) -> Result<(Order, Group), OrderError> {
        let updated = self
            .orders
            .attach_rider(order_id, OrderStatus::DeliveryPublished, OrderStatus::Assigned, rider_id)
            .await?;
        let group = self.groups.get_by_order(order_id).await?;
        self.groups.attach_rider(group.id, rider_id).await?;

        let mut with_rider = group;
        with_rider.rider_id = Some(rider_id);
        Ok((updated, with_rider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::store::FakeGroupStore;
    use crate::order::store::FakeOrderStore;
    use crate::product::model::Product;
    use crate::product::store::FakeProductStore;

    fn seed_product(products: &FakeProductStore, id: ProductId, stock: i32) {
        products.seed(Product {
            id,
            shop_id: 1,
            name: "test".into(),
            price: Money::new(1500, 2),
            stock,
            is_flash_sale: false,
        });
    }

    #[tokio::test]
    async fn place_regular_deducts_stock_and_creates_order() {
        let products = Arc::new(FakeProductStore::new());
        seed_product(&products, 1, 5);
        let fake = FakeOrderTransactions::new(Arc::new(FakeOrderStore::new()), products.clone(), Arc::new(FakeGroupStore::new()));

        let order = fake
            .place_regular(1, 1, 1, 2, Money::new(1500, 2), Money::new(200, 2))
            .await
            .expect("place");

        assert_eq!(order.quantity, 2);
        assert_eq!(products.get(1).await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn place_regular_out_of_stock_leaves_order_uncreated() {
        let products = Arc::new(FakeProductStore::new());
        seed_product(&products, 1, 1);
        let fake = FakeOrderTransactions::new(Arc::new(FakeOrderStore::new()), products.clone(), Arc::new(FakeGroupStore::new()));

        let err = fake
            .place_regular(1, 1, 1, 2, Money::new(1500, 2), Money::new(200, 2))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::OutOfStock(1)));
        assert_eq!(products.get(1).await.unwrap().stock, 1);
    }

    #[tokio::test]
    async fn confirm_with_group_sets_group_id_on_the_order() {
        let orders = Arc::new(FakeOrderStore::new());
        let fake = FakeOrderTransactions::new(orders.clone(), Arc::new(FakeProductStore::new()), Arc::new(FakeGroupStore::new()));
        let order = orders
            .create(1, 1, 1, 1, Money::new(1000, 2), Money::new(100, 2))
            .await
            .unwrap();

        let (confirmed, group) = fake.confirm_with_group(order.id, 1).await.expect("confirm");

        assert_eq!(confirmed.group_id, Some(group.id));
        assert_eq!(group.order_id, order.id);
    }

    #[tokio::test]
    async fn confirm_with_group_rejects_wrong_shop() {
        let orders = Arc::new(FakeOrderStore::new());
        let fake = FakeOrderTransactions::new(orders.clone(), Arc::new(FakeProductStore::new()), Arc::new(FakeGroupStore::new()));
        let order = orders
            .create(1, 1, 1, 1, Money::new(1000, 2), Money::new(100, 2))
            .await
            .unwrap();

        let err = fake.confirm_with_group(order.id, 2).await.unwrap_err();
        assert!(matches!(err, OrderError::OwnershipViolation { .. }));
    }

    #[tokio::test]
    async fn accept_with_group_attaches_rider_to_both_rows() {
        let orders = Arc::new(FakeOrderStore::new());
        let fake = FakeOrderTransactions::new(orders.clone(), Arc::new(FakeProductStore::new()), Arc::new(FakeGroupStore::new()));
        let order = orders
            .create(1, 1, 1, 1, Money::new(1000, 2), Money::new(100, 2))
            .await
            .unwrap();
        let (order, _group) = fake.confirm_with_group(order.id, 1).await.unwrap();
        orders
            .update_status_if(order.id, OrderStatus::MerchantConfirmed, OrderStatus::DeliveryPublished)
            .await
            .unwrap();

        let (updated, group) = fake.accept_with_group(order.id, 9).await.expect("accept");

        assert_eq!(updated.rider_id, Some(9));
        assert_eq!(group.rider_id, Some(9));
    }
}
