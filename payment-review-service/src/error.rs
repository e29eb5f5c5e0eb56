use payment_db_entity::db::transaction_record::TransactionStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Illegal status transition: {from} -> {to}")]
    Transition {
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Text recognition failed: {0}")]
    Recognition(String),

    #[error("Sync failure in {op}: {message}")]
    Sync { op: &'static str, message: String },
}
