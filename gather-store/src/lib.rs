pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod enrollment_repo;
pub mod hotel_repo;
pub mod ticket_repo;

pub use booking_repo::PostgresBookingRepository;
pub use database::DbClient;
pub use enrollment_repo::PostgresEnrollmentRepository;
pub use hotel_repo::PostgresHotelRepository;
pub use ticket_repo::PostgresTicketRepository;

pub(crate) fn store_err(err: sqlx::Error) -> gather_core::repository::StoreError {
    gather_core::repository::StoreError(err.to_string())
}
