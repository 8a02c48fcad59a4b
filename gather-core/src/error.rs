use crate::repository::StoreError;

/// Failure kinds surfaced to the API boundary. Each maps to a stable status
/// signal there; read-path eligibility denials are `PaymentRequired` while
/// write-path denials are `Forbidden`, and that asymmetry is deliberate.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("action forbidden: {0}")]
    Forbidden(&'static str),

    #[error("payment required: {0}")]
    PaymentRequired(&'static str),

    #[error("the room is fully booked")]
    RoomFullyBooked,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}
