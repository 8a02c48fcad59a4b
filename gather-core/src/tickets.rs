use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::repository::{
    EnrollmentRepository, PaymentInsertError, TicketInsertError, TicketRepository,
};
use crate::ticket::{CardData, NewPayment, Payment, Ticket, TicketStatus, TicketWithType, TicketType};
use crate::ServiceResult;

/// Creates tickets in RESERVED state and transitions them to PAID when a
/// payment is recorded. PAID is terminal.
pub struct TicketLifecycle {
    enrollments: Arc<dyn EnrollmentRepository>,
    tickets: Arc<dyn TicketRepository>,
}

impl TicketLifecycle {
    pub fn new(
        enrollments: Arc<dyn EnrollmentRepository>,
        tickets: Arc<dyn TicketRepository>,
    ) -> Self {
        Self {
            enrollments,
            tickets,
        }
    }

    pub async fn list_ticket_types(&self) -> ServiceResult<Vec<TicketType>> {
        Ok(self.tickets.list_ticket_types().await?)
    }

    pub async fn ticket_for_user(&self, user_id: Uuid) -> ServiceResult<TicketWithType> {
        let enrollment = self
            .enrollments
            .find_by_user(user_id)
            .await?
            .ok_or(ServiceError::NotFound("enrollment"))?;
        self.tickets
            .find_by_enrollment(enrollment.id)
            .await?
            .ok_or(ServiceError::NotFound("ticket"))
    }

    /// Create a RESERVED ticket for an enrollment. An enrollment may hold
    /// at most one ticket; the store enforces that inside the insert.
    pub async fn create_ticket(
        &self,
        enrollment_id: Uuid,
        ticket_type_id: Uuid,
    ) -> ServiceResult<Ticket> {
        if self.enrollments.find_by_id(enrollment_id).await?.is_none() {
            return Err(ServiceError::NotFound("enrollment"));
        }
        if self.tickets.ticket_type(ticket_type_id).await?.is_none() {
            return Err(ServiceError::NotFound("ticket type"));
        }

        let ticket = self
            .tickets
            .create_reserved(enrollment_id, ticket_type_id)
            .await
            .map_err(|e| match e {
                TicketInsertError::AlreadyExists(_) => {
                    ServiceError::Conflict("user already has a ticket".to_string())
                }
                TicketInsertError::Store(e) => ServiceError::Store(e),
            })?;

        info!(ticket_id = %ticket.id, %enrollment_id, "ticket created");
        Ok(ticket)
    }

    /// Create a ticket for the enrollment owned by `user_id`.
    pub async fn create_ticket_for_user(
        &self,
        user_id: Uuid,
        ticket_type_id: Uuid,
    ) -> ServiceResult<Ticket> {
        let enrollment = self
            .enrollments
            .find_by_user(user_id)
            .await?
            .ok_or(ServiceError::NotFound("enrollment"))?;
        self.create_ticket(enrollment.id, ticket_type_id).await
    }

    /// Record a payment for a ticket. The charge is the ticket type's
    /// price; the status flip and the payment row commit together.
    pub async fn record_payment(&self, ticket_id: Uuid, card: CardData) -> ServiceResult<Payment> {
        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or(ServiceError::NotFound("ticket"))?;

        if ticket.ticket.status == TicketStatus::Paid {
            return Err(ServiceError::Conflict(
                "ticket has already been paid".to_string(),
            ));
        }

        let payment = self
            .tickets
            .record_payment(NewPayment {
                ticket_id,
                card_issuer: card.issuer.clone(),
                card_last_digits: card.last_digits(),
                value: ticket.ticket_type.price,
            })
            .await
            .map_err(|e| match e {
                // A racing payment that slipped past the status check above
                // loses to the unique key, not to a 500.
                PaymentInsertError::AlreadyRecorded(_) => {
                    ServiceError::Conflict("ticket has already been paid".to_string())
                }
                PaymentInsertError::Store(e) => ServiceError::Store(e),
            })?;

        info!(%ticket_id, value = payment.value, "payment recorded, ticket paid");
        Ok(payment)
    }

    /// The payment recorded for a ticket, visible only to the ticket's
    /// owner.
    pub async fn payment_for_ticket(
        &self,
        ticket_id: Uuid,
        user_id: Uuid,
    ) -> ServiceResult<Payment> {
        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or(ServiceError::NotFound("ticket"))?;

        let enrollment = self
            .enrollments
            .find_by_id(ticket.ticket.enrollment_id)
            .await?
            .ok_or(ServiceError::NotFound("enrollment"))?;
        if enrollment.user_id != user_id {
            return Err(ServiceError::Unauthorized(
                "ticket belongs to another user",
            ));
        }

        self.tickets
            .payment_for_ticket(ticket_id)
            .await?
            .ok_or(ServiceError::NotFound("payment"))
    }
}
