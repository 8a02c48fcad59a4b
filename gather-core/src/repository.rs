use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::BookingWithRoom;
use crate::enrollment::Enrollment;
use crate::hotel::{Hotel, HotelWithRooms, Room};
use crate::ticket::{NewPayment, Payment, Ticket, TicketWithType, TicketType};

/// Backend failure with no domain meaning.
#[derive(Debug, thiserror::Error)]
#[error("storage backend error: {0}")]
pub struct StoreError(pub String);

/// Outcome of a conditional booking write. The capacity check and the write
/// are one atomic unit inside the store; these variants report why the unit
/// refused to commit.
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("room {0} does not exist")]
    RoomMissing(Uuid),

    #[error("room {0} has no free slots")]
    SlotsExhausted(Uuid),

    #[error("user {0} already holds a booking")]
    DuplicateHolder(Uuid),

    /// The write lost a serialization conflict with a concurrent admission.
    /// Retryable.
    #[error("capacity check conflicted with a concurrent write")]
    Contended,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a reserved-ticket insert.
#[derive(Debug, thiserror::Error)]
pub enum TicketInsertError {
    #[error("enrollment {0} already holds a ticket")]
    AlreadyExists(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a payment insert. The unique key on the ticket reference is
/// the arbiter when two payments race for one ticket.
#[derive(Debug, thiserror::Error)]
pub enum PaymentInsertError {
    #[error("ticket {0} already has a payment")]
    AlreadyRecorded(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Enrollment>, StoreError>;

    async fn find_by_id(&self, enrollment_id: Uuid) -> Result<Option<Enrollment>, StoreError>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn find_by_enrollment(
        &self,
        enrollment_id: Uuid,
    ) -> Result<Option<TicketWithType>, StoreError>;

    async fn find_by_id(&self, ticket_id: Uuid) -> Result<Option<TicketWithType>, StoreError>;

    async fn ticket_type(&self, ticket_type_id: Uuid) -> Result<Option<TicketType>, StoreError>;

    async fn list_ticket_types(&self) -> Result<Vec<TicketType>, StoreError>;

    /// Insert a RESERVED ticket. The one-ticket-per-enrollment rule is
    /// enforced inside the same write, not by a separate lookup.
    async fn create_reserved(
        &self,
        enrollment_id: Uuid,
        ticket_type_id: Uuid,
    ) -> Result<Ticket, TicketInsertError>;

    /// Persist a payment and flip its ticket to PAID in one transaction.
    /// A ticket must never be observable as PAID without its payment row.
    async fn record_payment(&self, payment: NewPayment) -> Result<Payment, PaymentInsertError>;

    async fn payment_for_ticket(&self, ticket_id: Uuid) -> Result<Option<Payment>, StoreError>;
}

#[async_trait]
pub trait HotelRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Hotel>, StoreError>;

    async fn find_with_rooms(&self, hotel_id: Uuid) -> Result<Option<HotelWithRooms>, StoreError>;

    async fn room(&self, room_id: Uuid) -> Result<Option<Room>, StoreError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<BookingWithRoom>, StoreError>;

    /// Insert a booking only if the room still has a free slot, atomically
    /// with respect to every other admission on the same room.
    async fn insert_if_free_slot(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        room_id: Uuid,
    ) -> Result<(), SlotError>;

    /// Reassign a booking to `new_room_id` only if that room has a free
    /// slot. The moved booking itself is excluded from the destination
    /// count, so a same-room move never self-blocks.
    async fn move_if_free_slot(
        &self,
        booking_id: Uuid,
        new_room_id: Uuid,
    ) -> Result<(), SlotError>;
}
