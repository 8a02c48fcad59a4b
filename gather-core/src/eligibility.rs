use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::enrollment::Enrollment;
use crate::repository::{EnrollmentRepository, StoreError, TicketRepository};
use crate::ticket::{Ticket, TicketStatus, TicketType};

/// Everything the eligibility chain resolved on the way to a "yes".
#[derive(Debug, Clone)]
pub struct HotelEligibility {
    pub enrollment: Enrollment,
    pub ticket: Ticket,
    pub ticket_type: TicketType,
}

/// Why a user may not book hotel rooms. Callers map these to their own
/// failure kinds: browsing maps rule violations to PaymentRequired, booking
/// maps every variant to Forbidden.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    #[error("user has no enrollment")]
    NoEnrollment,

    #[error("enrollment has no ticket")]
    NoTicket,

    #[error("ticket has not been paid")]
    TicketNotPaid,

    #[error("ticket is for remote attendance")]
    RemoteTicket,

    #[error("ticket does not include hotel")]
    HotelNotIncluded,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolves enrollment, ticket, and ticket type for a user and decides
/// whether hotel booking is allowed. Pure read; no side effects.
pub struct EligibilityEvaluator {
    enrollments: Arc<dyn EnrollmentRepository>,
    tickets: Arc<dyn TicketRepository>,
}

impl EligibilityEvaluator {
    pub fn new(
        enrollments: Arc<dyn EnrollmentRepository>,
        tickets: Arc<dyn TicketRepository>,
    ) -> Self {
        Self {
            enrollments,
            tickets,
        }
    }

    pub async fn evaluate_hotel_access(
        &self,
        user_id: Uuid,
    ) -> Result<HotelEligibility, EligibilityError> {
        let enrollment = self
            .enrollments
            .find_by_user(user_id)
            .await?
            .ok_or(EligibilityError::NoEnrollment)?;

        let ticket = self
            .tickets
            .find_by_enrollment(enrollment.id)
            .await?
            .ok_or(EligibilityError::NoTicket)?;

        if ticket.ticket.status != TicketStatus::Paid {
            debug!(%user_id, "hotel access denied: ticket not paid");
            return Err(EligibilityError::TicketNotPaid);
        }
        if ticket.ticket_type.is_remote {
            debug!(%user_id, "hotel access denied: remote ticket");
            return Err(EligibilityError::RemoteTicket);
        }
        if !ticket.ticket_type.includes_hotel {
            debug!(%user_id, "hotel access denied: hotel not included");
            return Err(EligibilityError::HotelNotIncluded);
        }

        Ok(HotelEligibility {
            enrollment,
            ticket: ticket.ticket,
            ticket_type: ticket.ticket_type,
        })
    }
}
