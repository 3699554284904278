//! PostgreSQL-backed store implementation.
//!
//! Each `commit_*` method maps to one database transaction. Stock claims
//! become `UPDATE ... WHERE version = $n AND stock >= $q`: a claim that
//! affects zero rows lost the optimistic race and rolls back the whole
//! unit of work.

use async_trait::async_trait;
use common::{BuyerId, Money, OrderId, PaymentId, ProductId, SellerId, ShipmentId};
use domain::{CardBrand, Contact, Order, OrderLine, OrderStatus, Payment, PaymentStatus, Receiver, Shipment};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::product::{Product, Restock, StockClaim};
use crate::store::{Page, Store};

/// PostgreSQL implementation of [`Store`].
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    async fn lines_for_order(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let rows = sqlx::query(
            "SELECT product_id, product_name, quantity, price_snapshot_cents \
             FROM order_lines WHERE order_id = $1 ORDER BY line_no",
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_line).collect()
    }

    async fn hydrate_order(&self, row: PgRow) -> Result<Order> {
        let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
        let lines = self.lines_for_order(id).await?;
        row_to_order(&row, lines)
    }
}

fn parse_order_status(s: &str) -> Result<OrderStatus> {
    OrderStatus::parse(s).ok_or_else(|| StoreError::Corrupt {
        column: "orders.status",
        value: s.to_string(),
    })
}

fn row_to_line(row: PgRow) -> Result<OrderLine> {
    let quantity: i32 = row.try_get("quantity")?;
    OrderLine::new(
        row.try_get::<String, _>("product_id")?,
        row.try_get::<String, _>("product_name")?,
        quantity as u32,
        Money::from_cents(row.try_get("price_snapshot_cents")?),
    )
    .map_err(|_| StoreError::Corrupt {
        column: "order_lines.quantity",
        value: quantity.to_string(),
    })
}

fn row_to_order(row: &PgRow, lines: Vec<OrderLine>) -> Result<Order> {
    let status: String = row.try_get("status")?;
    Ok(Order::from_stored(
        OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        BuyerId::from_uuid(row.try_get::<Uuid, _>("buyer_id")?),
        SellerId::from_uuid(row.try_get::<Uuid, _>("seller_id")?),
        Contact::new(
            row.try_get::<String, _>("consumer_name")?,
            row.try_get::<String, _>("consumer_phone")?,
        ),
        Receiver::new(
            row.try_get::<String, _>("receiver_name")?,
            row.try_get::<String, _>("receiver_phone")?,
            row.try_get::<String, _>("receiver_address")?,
        ),
        parse_order_status(&status)?,
        row.try_get("ordered_at")?,
        lines,
        row.try_get("refund_requested")?,
        row.try_get("refund_reason")?,
    ))
}

fn row_to_product(row: PgRow) -> Result<Product> {
    let stock: i64 = row.try_get("stock")?;
    let version: i64 = row.try_get("version")?;
    Ok(Product {
        id: ProductId::new(row.try_get::<String, _>("id")?),
        seller_id: SellerId::from_uuid(row.try_get::<Uuid, _>("seller_id")?),
        name: row.try_get("name")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        stock: u32::try_from(stock).map_err(|_| StoreError::Corrupt {
            column: "products.stock",
            value: stock.to_string(),
        })?,
        visible: row.try_get("visible")?,
        version: version as u64,
    })
}

fn row_to_payment(row: PgRow) -> Result<Payment> {
    let brand: String = row.try_get("brand")?;
    let status: String = row.try_get("status")?;
    Ok(Payment::from_stored(
        PaymentId::from_uuid(row.try_get::<Uuid, _>("id")?),
        OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        CardBrand::parse(&brand).ok_or_else(|| StoreError::Corrupt {
            column: "payments.brand",
            value: brand.clone(),
        })?,
        Money::from_cents(row.try_get("amount_cents")?),
        PaymentStatus::parse(&status).ok_or_else(|| StoreError::Corrupt {
            column: "payments.status",
            value: status.clone(),
        })?,
        row.try_get("transaction_id")?,
        row.try_get("refund_requested")?,
        row.try_get("refund_reason")?,
        row.try_get("attempted_at")?,
    ))
}

fn row_to_shipment(row: PgRow) -> Result<Shipment> {
    Ok(Shipment {
        id: ShipmentId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        tracking_number: row.try_get("tracking_number")?,
        carrier: row.try_get("carrier")?,
        shipped_at: row.try_get("shipped_at")?,
    })
}

async fn insert_order_tx(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (id, buyer_id, seller_id, consumer_name, consumer_phone,
                            receiver_name, receiver_phone, receiver_address,
                            status, refund_requested, refund_reason, ordered_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(order.id().as_uuid())
    .bind(order.buyer_id().as_uuid())
    .bind(order.seller_id().as_uuid())
    .bind(&order.consumer().name)
    .bind(&order.consumer().phone)
    .bind(&order.receiver().name)
    .bind(&order.receiver().phone)
    .bind(&order.receiver().address)
    .bind(order.status().as_str())
    .bind(order.refund_requested())
    .bind(order.refund_reason())
    .bind(order.ordered_at())
    .execute(&mut **tx)
    .await?;

    for (line_no, line) in order.lines().iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_lines (order_id, line_no, product_id, product_name,
                                     quantity, price_snapshot_cents)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(line_no as i32)
        .bind(line.product_id().as_str())
        .bind(line.product_name())
        .bind(line.quantity() as i32)
        .bind(line.price_snapshot().cents())
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Writes the mutable order columns, guarded on the expected source status.
async fn update_order_tx(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
    expect: OrderStatus,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = $2, refund_requested = $3, refund_reason = $4
        WHERE id = $1 AND status = $5
        "#,
    )
    .bind(order.id().as_uuid())
    .bind(order.status().as_str())
    .bind(order.refund_requested())
    .bind(order.refund_reason())
    .bind(expect.as_str())
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::StaleOrder {
            order_id: order.id(),
        });
    }
    Ok(())
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, seller_id, name, price_cents, stock, visible, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                seller_id = EXCLUDED.seller_id,
                name = EXCLUDED.name,
                price_cents = EXCLUDED.price_cents,
                stock = EXCLUDED.stock,
                visible = EXCLUDED.visible,
                version = EXCLUDED.version
            "#,
        )
        .bind(product.id.as_str())
        .bind(product.seller_id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(i64::from(product.stock))
        .bind(product.visible)
        .bind(product.version as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn product(&self, id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_product).transpose()
    }

    async fn commit_checkout(&self, orders: &[Order], claims: &[StockClaim]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for claim in claims {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - $2, version = version + 1
                WHERE id = $1 AND version = $3 AND stock >= $2
                "#,
            )
            .bind(claim.product_id.as_str())
            .bind(i64::from(claim.quantity))
            .bind(claim.expected_version as i64)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let actual: Option<i64> =
                    sqlx::query_scalar("SELECT version FROM products WHERE id = $1")
                        .bind(claim.product_id.as_str())
                        .fetch_optional(&mut *tx)
                        .await?;
                tracing::debug!(
                    product_id = %claim.product_id,
                    expected = claim.expected_version,
                    "stock claim affected no rows"
                );
                // Dropping the transaction rolls back earlier claims.
                return match actual {
                    Some(actual) => Err(StoreError::VersionConflict {
                        product_id: claim.product_id.clone(),
                        expected: claim.expected_version,
                        actual: actual as u64,
                    }),
                    None => Err(StoreError::ProductNotFound(claim.product_id.clone())),
                };
            }
        }

        for order in orders {
            insert_order_tx(&mut tx, order).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn commit_cancellation(&self, order: &Order, restocks: &[Restock]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        update_order_tx(&mut tx, order, OrderStatus::Placed).await?;

        for restock in restocks {
            let result = sqlx::query(
                "UPDATE products SET stock = stock + $2, version = version + 1 WHERE id = $1",
            )
            .bind(restock.product_id.as_str())
            .bind(i64::from(restock.quantity))
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(StoreError::ProductNotFound(restock.product_id.clone()));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn commit_payment(
        &self,
        order: &Order,
        payment: &Payment,
        expect: OrderStatus,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        update_order_tx(&mut tx, order, expect).await?;

        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, brand, amount_cents, status,
                                  transaction_id, refund_requested, refund_reason, attempted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                transaction_id = EXCLUDED.transaction_id,
                refund_requested = EXCLUDED.refund_requested,
                refund_reason = EXCLUDED.refund_reason
            "#,
        )
        .bind(payment.id().as_uuid())
        .bind(payment.order_id().as_uuid())
        .bind(payment.brand().as_str())
        .bind(payment.amount().cents())
        .bind(payment.status().as_str())
        .bind(payment.transaction_id())
        .bind(payment.refund_requested())
        .bind(payment.refund_reason())
        .bind(payment.attempted_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            // The partial unique index backs up the duplicate-payment guard.
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("uniq_active_payment")
            {
                return StoreError::StaleOrder {
                    order_id: order.id(),
                };
            }
            StoreError::Database(e)
        })?;

        tx.commit().await?;
        Ok(())
    }

    async fn commit_shipment(
        &self,
        order: &Order,
        shipment: &Shipment,
        expect: OrderStatus,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        update_order_tx(&mut tx, order, expect).await?;

        sqlx::query(
            r#"
            INSERT INTO shipments (id, order_id, tracking_number, carrier, shipped_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(shipment.id.as_uuid())
        .bind(shipment.order_id.as_uuid())
        .bind(&shipment.tracking_number)
        .bind(&shipment.carrier)
        .bind(shipment.shipped_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_order(&self, order: &Order, expect: OrderStatus) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        update_order_tx(&mut tx, order, expect).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate_order(row).await?)),
            None => Ok(None),
        }
    }

    async fn orders_for_buyer(&self, buyer_id: BuyerId, page: Page) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT * FROM orders WHERE buyer_id = $1 \
             ORDER BY ordered_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(buyer_id.as_uuid())
        .bind(i64::from(page.size))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(self.hydrate_order(row).await?);
        }
        Ok(orders)
    }

    async fn orders_for_seller(&self, seller_id: SellerId, page: Page) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT * FROM orders WHERE seller_id = $1 \
             ORDER BY ordered_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(seller_id.as_uuid())
        .bind(i64::from(page.size))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(self.hydrate_order(row).await?);
        }
        Ok(orders)
    }

    async fn payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        let row = sqlx::query("SELECT * FROM payments WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_payment).transpose()
    }

    async fn active_payment_for_order(&self, order_id: OrderId) -> Result<Option<Payment>> {
        let row = sqlx::query(
            "SELECT * FROM payments WHERE order_id = $1 AND status IN ('PENDING', 'APPROVED')",
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_payment).transpose()
    }

    async fn shipment_for_order(&self, order_id: OrderId) -> Result<Option<Shipment>> {
        let row = sqlx::query("SELECT * FROM shipments WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_shipment).transpose()
    }
}
