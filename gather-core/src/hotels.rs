use std::sync::Arc;
use uuid::Uuid;

use crate::eligibility::{EligibilityError, EligibilityEvaluator};
use crate::error::ServiceError;
use crate::hotel::{Hotel, HotelWithRooms};
use crate::repository::HotelRepository;
use crate::ServiceResult;

/// Hotel browsing, gated by the same eligibility chain as booking but
/// denying with PaymentRequired instead of Forbidden.
pub struct HotelsDirectory {
    eligibility: Arc<EligibilityEvaluator>,
    hotels: Arc<dyn HotelRepository>,
}

impl HotelsDirectory {
    pub fn new(eligibility: Arc<EligibilityEvaluator>, hotels: Arc<dyn HotelRepository>) -> Self {
        Self { eligibility, hotels }
    }

    pub async fn hotels(&self, user_id: Uuid) -> ServiceResult<Vec<Hotel>> {
        self.check_access(user_id).await?;
        let hotels = self.hotels.list().await?;
        if hotels.is_empty() {
            return Err(ServiceError::NotFound("hotels"));
        }
        Ok(hotels)
    }

    pub async fn hotel_with_rooms(
        &self,
        hotel_id: Uuid,
        user_id: Uuid,
    ) -> ServiceResult<HotelWithRooms> {
        self.check_access(user_id).await?;
        self.hotels
            .find_with_rooms(hotel_id)
            .await?
            .ok_or(ServiceError::NotFound("hotel"))
    }

    async fn check_access(&self, user_id: Uuid) -> ServiceResult<()> {
        match self.eligibility.evaluate_hotel_access(user_id).await {
            Ok(_) => Ok(()),
            Err(EligibilityError::NoEnrollment) => Err(ServiceError::NotFound("enrollment")),
            Err(EligibilityError::NoTicket) => Err(ServiceError::NotFound("ticket")),
            Err(EligibilityError::TicketNotPaid) => {
                Err(ServiceError::PaymentRequired("ticket has not been paid"))
            }
            Err(EligibilityError::RemoteTicket) => {
                Err(ServiceError::PaymentRequired("ticket is for remote attendance"))
            }
            Err(EligibilityError::HotelNotIncluded) => {
                Err(ServiceError::PaymentRequired("ticket does not include hotel"))
            }
            Err(EligibilityError::Store(e)) => Err(ServiceError::Store(e)),
        }
    }
}
