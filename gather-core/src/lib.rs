pub mod booking;
pub mod capacity;
pub mod eligibility;
pub mod enrollment;
pub mod error;
pub mod hotel;
pub mod hotels;
pub mod pii;
pub mod repository;
pub mod reservation;
pub mod ticket;
pub mod tickets;

#[cfg(test)]
pub(crate) mod memory;

pub use error::ServiceError;

pub type ServiceResult<T> = Result<T, ServiceError>;
