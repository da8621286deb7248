use thiserror::Error;

/// Errors raised while mapping descriptors and rows onto stored tables.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Type \"{0}\" is not supported")]
    UnsupportedType(String),

    #[error("Field \"{field}\" cannot cast value: {message}")]
    Cast { field: String, message: String },

    #[error("Bucket \"{0}\" already exists")]
    AlreadyExists(String),

    #[error("Bucket \"{0}\" doesn't exist")]
    NotFound(String),

    #[error("Table shape mismatch: {0}")]
    Shape(String),
}

impl StorageError {
    pub fn cast(field: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Cast {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        StorageError::InvalidDescriptor(message.into())
    }

    pub fn is_cast(&self) -> bool {
        matches!(self, StorageError::Cast { .. })
    }
}

/// Result type for storage and mapping operations
pub type Result<T> = std::result::Result<T, StorageError>;
