use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("API request to {endpoint} failed with status {status}")]
    Api { endpoint: String, status: u16 },

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },
}

impl LibraryError {
    /// Whether retrying the request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LibraryError::Bridge(err) => err.is_transient(),
            LibraryError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
