//! Storage error types.

use common::{ErrorKind, OrderId, ProductId};
use thiserror::Error;

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A stock claim lost the compare-and-swap race on the product version.
    #[error("version conflict for product {product_id}: expected {expected}, found {actual}")]
    VersionConflict {
        product_id: ProductId,
        expected: u64,
        actual: u64,
    },

    /// The order's status changed concurrently; the guarded write did not
    /// match the expected source status.
    #[error("order {order_id} was modified concurrently")]
    StaleOrder { order_id: OrderId },

    /// Product missing from the ledger.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// Order missing from storage.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// A persisted value could not be read back.
    #[error("invalid stored value {value:?} in column {column}")]
    Corrupt { column: &'static str, value: String },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Returns the machine-readable kind of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::VersionConflict { .. } | StoreError::StaleOrder { .. } => {
                ErrorKind::Conflict
            }
            StoreError::ProductNotFound(_) | StoreError::OrderNotFound(_) => ErrorKind::NotFound,
            StoreError::Corrupt { .. } | StoreError::Database(_) | StoreError::Migration(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
