use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use gather_core::repository::{PaymentInsertError, StoreError, TicketInsertError, TicketRepository};
use gather_core::ticket::{NewPayment, Payment, Ticket, TicketStatus, TicketWithType, TicketType};

use crate::store_err;

pub struct PostgresTicketRepository {
    pool: PgPool,
}

impl PostgresTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    enrollment_id: Uuid,
    ticket_type_id: Uuid,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    type_name: String,
    price: i32,
    is_remote: bool,
    includes_hotel: bool,
}

impl TicketRow {
    fn into_ticket_with_type(self) -> Result<TicketWithType, StoreError> {
        let status = TicketStatus::parse(&self.status)
            .ok_or_else(|| StoreError(format!("unknown ticket status {:?}", self.status)))?;
        Ok(TicketWithType {
            ticket: Ticket {
                id: self.id,
                enrollment_id: self.enrollment_id,
                ticket_type_id: self.ticket_type_id,
                status,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            ticket_type: TicketType {
                id: self.ticket_type_id,
                name: self.type_name,
                price: self.price,
                is_remote: self.is_remote,
                includes_hotel: self.includes_hotel,
            },
        })
    }
}

#[derive(sqlx::FromRow)]
struct TicketTypeRow {
    id: Uuid,
    name: String,
    price: i32,
    is_remote: bool,
    includes_hotel: bool,
}

impl From<TicketTypeRow> for TicketType {
    fn from(row: TicketTypeRow) -> Self {
        TicketType {
            id: row.id,
            name: row.name,
            price: row.price,
            is_remote: row.is_remote,
            includes_hotel: row.includes_hotel,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    ticket_id: Uuid,
    card_issuer: String,
    card_last_digits: String,
    value: i32,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Payment {
            id: row.id,
            ticket_id: row.ticket_id,
            card_issuer: row.card_issuer,
            card_last_digits: row.card_last_digits,
            value: row.value,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const TICKET_WITH_TYPE: &str = "SELECT t.id, t.enrollment_id, t.ticket_type_id, t.status, \
     t.created_at, t.updated_at, tt.name AS type_name, tt.price, tt.is_remote, tt.includes_hotel \
     FROM tickets t JOIN ticket_types tt ON tt.id = t.ticket_type_id";

#[async_trait]
impl TicketRepository for PostgresTicketRepository {
    async fn find_by_enrollment(
        &self,
        enrollment_id: Uuid,
    ) -> Result<Option<TicketWithType>, StoreError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "{TICKET_WITH_TYPE} WHERE t.enrollment_id = $1"
        ))
        .bind(enrollment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(TicketRow::into_ticket_with_type).transpose()
    }

    async fn find_by_id(&self, ticket_id: Uuid) -> Result<Option<TicketWithType>, StoreError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!("{TICKET_WITH_TYPE} WHERE t.id = $1"))
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        row.map(TicketRow::into_ticket_with_type).transpose()
    }

    async fn ticket_type(&self, ticket_type_id: Uuid) -> Result<Option<TicketType>, StoreError> {
        let row = sqlx::query_as::<_, TicketTypeRow>(
            "SELECT id, name, price, is_remote, includes_hotel FROM ticket_types WHERE id = $1",
        )
        .bind(ticket_type_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(TicketType::from))
    }

    async fn list_ticket_types(&self) -> Result<Vec<TicketType>, StoreError> {
        let rows = sqlx::query_as::<_, TicketTypeRow>(
            "SELECT id, name, price, is_remote, includes_hotel FROM ticket_types ORDER BY price",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(TicketType::from).collect())
    }

    async fn create_reserved(
        &self,
        enrollment_id: Uuid,
        ticket_type_id: Uuid,
    ) -> Result<Ticket, TicketInsertError> {
        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            enrollment_id,
            ticket_type_id,
            status: TicketStatus::Reserved,
            created_at: now,
            updated_at: now,
        };

        // The unique key on enrollment_id is the existence check; a lost
        // race surfaces as a unique violation instead of a second ticket.
        let result = sqlx::query(
            "INSERT INTO tickets (id, enrollment_id, ticket_type_id, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5)",
        )
        .bind(ticket.id)
        .bind(ticket.enrollment_id)
        .bind(ticket.ticket_type_id)
        .bind(ticket.status.as_str())
        .bind(ticket.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(ticket),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(TicketInsertError::AlreadyExists(enrollment_id))
            }
            Err(e) => Err(TicketInsertError::Store(store_err(e))),
        }
    }

    async fn record_payment(&self, payment: NewPayment) -> Result<Payment, PaymentInsertError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let updated = sqlx::query(
            "UPDATE tickets SET status = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(TicketStatus::Paid.as_str())
        .bind(now)
        .bind(payment.ticket_id)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;
        if updated.rows_affected() == 0 {
            return Err(PaymentInsertError::Store(StoreError(format!(
                "payment references missing ticket {}",
                payment.ticket_id
            ))));
        }

        let row = Payment {
            id: Uuid::new_v4(),
            ticket_id: payment.ticket_id,
            card_issuer: payment.card_issuer,
            card_last_digits: payment.card_last_digits,
            value: payment.value,
            created_at: now,
            updated_at: now,
        };
        // The unique key on ticket_id decides a race between two payments
        // for the same ticket.
        let inserted = sqlx::query(
            "INSERT INTO payments (id, ticket_id, card_issuer, card_last_digits, value, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
        )
        .bind(row.id)
        .bind(row.ticket_id)
        .bind(&row.card_issuer)
        .bind(&row.card_last_digits)
        .bind(row.value)
        .bind(row.created_at)
        .execute(&mut *tx)
        .await;
        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(PaymentInsertError::AlreadyRecorded(row.ticket_id));
            }
            Err(e) => return Err(PaymentInsertError::Store(store_err(e))),
        }

        tx.commit().await.map_err(store_err)?;
        Ok(row)
    }

    async fn payment_for_ticket(&self, ticket_id: Uuid) -> Result<Option<Payment>, StoreError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, ticket_id, card_issuer, card_last_digits, value, created_at, updated_at \
             FROM payments WHERE ticket_id = $1",
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(Payment::from))
    }
}
