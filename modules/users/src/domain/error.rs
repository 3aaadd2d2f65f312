use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    /// The patch carried no fields; nothing was written.
    #[error("empty update request")]
    EmptyUpdate,

    #[error("user id is required")]
    MissingId,

    #[error("user not found ({field} = '{value}')")]
    NotFound { field: &'static str, value: String },

    /// The storage engine rejected or failed the operation.
    #[error("{operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },
}

impl DomainError {
    pub fn not_found_by_id(id: impl Into<String>) -> Self {
        Self::NotFound {
            field: "id",
            value: id.into(),
        }
    }

    pub fn not_found_by_email(email: impl Into<String>) -> Self {
        Self::NotFound {
            field: "email",
            value: email.into(),
        }
    }

    /// Keep the whole context chain so the engine's own message survives.
    /// A `DomainError` raised by the repository itself passes through as is.
    pub fn storage(operation: &'static str, err: anyhow::Error) -> Self {
        match err.downcast::<DomainError>() {
            Ok(domain) => domain,
            Err(err) => Self::Storage {
                operation,
                message: format!("{err:#}"),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
