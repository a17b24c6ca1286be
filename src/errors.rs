use rust_decimal::Decimal;
use sea_orm::error::DbErr;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Duplicate association: product {product_id} is already assigned to category {category_id}")]
    DuplicateAssociation {
        product_id: Uuid,
        category_id: Uuid,
    },

    #[error("Referential integrity: {0}")]
    ReferentialIntegrity(String),

    #[error("Invalid state for {entity} {id}: cannot {attempted} while {current}")]
    InvalidState {
        entity: &'static str,
        id: Uuid,
        current: String,
        attempted: &'static str,
    },

    #[error("Transaction {0} has no lines")]
    EmptyTransaction(Uuid),

    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: Uuid,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Over-return on line {line_id}: remaining {remaining}, requested {requested}")]
    OverReturn {
        line_id: Uuid,
        remaining: Decimal,
        requested: Decimal,
    },

    #[error("Invalid line state: {0}")]
    InvalidLineState(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Concurrent modification: {0}")]
    ConcurrentModification(Uuid),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    /// Whether the caller can repair the request and retry.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::DatabaseError(_) | Self::EventError(_) | Self::InternalError(_) | Self::Other(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn insufficient_stock_message_carries_context() {
        let id = Uuid::nil();
        let err = ServiceError::InsufficientStock {
            product_id: id,
            available: dec!(2.00),
            requested: dec!(5.00),
        };
        let msg = err.to_string();
        assert!(msg.contains("available 2.00"));
        assert!(msg.contains("requested 5.00"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn invalid_state_names_the_transition() {
        let id = Uuid::nil();
        let err = ServiceError::InvalidState {
            entity: "transaction",
            id,
            current: "Finalized".to_string(),
            attempted: "add_line",
        };
        assert!(err.to_string().contains("cannot add_line while Finalized"));
    }

    #[test]
    fn database_errors_are_not_recoverable() {
        let err = ServiceError::db_error("connection reset");
        assert!(!err.is_recoverable());
    }
}
