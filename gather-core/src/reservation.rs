use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::booking::BookingWithRoom;
use crate::capacity::{CapacityError, CapacityGuard};
use crate::eligibility::{EligibilityError, EligibilityEvaluator};
use crate::error::ServiceError;
use crate::repository::{BookingRepository, HotelRepository};
use crate::ServiceResult;

/// Orchestrates eligibility and capacity for the one-booking-per-user
/// reservation flow: create, reassign, read.
pub struct ReservationManager {
    eligibility: Arc<EligibilityEvaluator>,
    guard: CapacityGuard,
    hotels: Arc<dyn HotelRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl ReservationManager {
    pub fn new(
        eligibility: Arc<EligibilityEvaluator>,
        guard: CapacityGuard,
        hotels: Arc<dyn HotelRepository>,
        bookings: Arc<dyn BookingRepository>,
    ) -> Self {
        Self {
            eligibility,
            guard,
            hotels,
            bookings,
        }
    }

    pub async fn booking_for_user(&self, user_id: Uuid) -> ServiceResult<BookingWithRoom> {
        self.bookings
            .find_by_user(user_id)
            .await?
            .ok_or(ServiceError::NotFound("booking"))
    }

    /// Create the user's booking. Eligibility failures surface as
    /// Forbidden here, unlike the browse paths.
    pub async fn create_booking(&self, user_id: Uuid, room_id: Uuid) -> ServiceResult<Uuid> {
        self.eligibility
            .evaluate_hotel_access(user_id)
            .await
            .map_err(forbid)?;

        if self.hotels.room(room_id).await?.is_none() {
            return Err(ServiceError::NotFound("room"));
        }

        let booking_id = Uuid::new_v4();
        self.guard
            .reserve_slot(booking_id, user_id, room_id)
            .await
            .map_err(admission_error)?;

        info!(%booking_id, %user_id, %room_id, "booking created");
        Ok(booking_id)
    }

    /// Reassign the user's booking to another room.
    pub async fn update_booking(
        &self,
        booking_id: Uuid,
        new_room_id: Uuid,
        user_id: Uuid,
    ) -> ServiceResult<()> {
        if self.hotels.room(new_room_id).await?.is_none() {
            return Err(ServiceError::NotFound("room"));
        }

        let current = self
            .bookings
            .find_by_user(user_id)
            .await?
            .ok_or(ServiceError::Forbidden("user has no booking to move"))?;
        if current.booking.id != booking_id {
            return Err(ServiceError::Forbidden("booking belongs to another user"));
        }

        self.guard
            .move_slot(booking_id, new_room_id)
            .await
            .map_err(admission_error)?;

        info!(%booking_id, %new_room_id, "booking moved");
        Ok(())
    }
}

/// Booking is a write path: every eligibility failure, missing records
/// included, is re-signaled as Forbidden.
fn forbid(err: EligibilityError) -> ServiceError {
    match err {
        EligibilityError::Store(e) => ServiceError::Store(e),
        EligibilityError::NoEnrollment
        | EligibilityError::NoTicket
        | EligibilityError::TicketNotPaid
        | EligibilityError::RemoteTicket
        | EligibilityError::HotelNotIncluded => {
            ServiceError::Forbidden("user is not eligible to book a hotel room")
        }
    }
}

fn admission_error(err: CapacityError) -> ServiceError {
    match err {
        CapacityError::RoomMissing(_) => ServiceError::NotFound("room"),
        CapacityError::Exhausted(_) => ServiceError::RoomFullyBooked,
        CapacityError::DuplicateHolder(_) => {
            ServiceError::Forbidden("user already has a booking")
        }
        CapacityError::Store(e) => ServiceError::Store(e),
    }
}
