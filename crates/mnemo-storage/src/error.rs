use mnemo_message::ConvertError;
use thiserror::Error;

use crate::schema::TableName;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Schema error on table {table}: {reason}")]
    Schema { table: String, reason: String },

    #[error("No backend configured for storage domain: {0}")]
    Unrouted(String),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Record already exists in {table}: {key}")]
    AlreadyExists { table: String, key: String },

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Message conversion error: {0}")]
    Conversion(#[from] ConvertError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    pub(crate) fn schema(table: TableName, reason: impl Into<String>) -> Self {
        Self::Schema {
            table: table.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn already_exists(table: TableName, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            table: table.to_string(),
            key: key.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
