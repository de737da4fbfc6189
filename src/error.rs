use thiserror::Error;

/// Row store faults. These surface as `StoreError` variants on the service
/// errors below; they are reported, never propagated raw to HTTP callers.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Table {table} has no row {row}")]
    RowOutOfRange { table: String, row: usize },
    #[error("Table {table} row {row} is too narrow: needed column {column}")]
    SchemaTooNarrow {
        table: String,
        row: usize,
        column: usize,
    },
}

#[derive(Debug, Clone, Error)]
pub enum BookingError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Booking store error: {0}")]
    StoreError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<StoreError> for BookingError {
    fn from(e: StoreError) -> Self {
        BookingError::StoreError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum TrackingError {
    #[error("Tracking store error: {0}")]
    StoreError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<StoreError> for TrackingError {
    fn from(e: StoreError) -> Self {
        TrackingError::StoreError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum MessageError {
    #[error("Message validation error: {0}")]
    ValidationError(String),
    #[error("Message store error: {0}")]
    StoreError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<StoreError> for MessageError {
    fn from(e: StoreError) -> Self {
        MessageError::StoreError(e.to_string())
    }
}
