use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use gather_core::booking::{Booking, BookingWithRoom};
use gather_core::hotel::Room;
use gather_core::repository::{BookingRepository, SlotError, StoreError};

use crate::store_err;

/// Serialization failure and deadlock SQLSTATEs; both mean the admission
/// lost a race and may be retried.
const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";
const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";

pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingWithRoomRow {
    id: Uuid,
    user_id: Uuid,
    room_id: Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    hotel_id: Uuid,
    room_name: String,
    capacity: i32,
}

impl From<BookingWithRoomRow> for BookingWithRoom {
    fn from(row: BookingWithRoomRow) -> Self {
        BookingWithRoom {
            booking: Booking {
                id: row.id,
                user_id: row.user_id,
                room_id: row.room_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            room: Room {
                id: row.room_id,
                hotel_id: row.hotel_id,
                name: row.room_name,
                capacity: row.capacity,
            },
        }
    }
}

fn classify_write_err(err: sqlx::Error, user_id: Option<Uuid>) -> SlotError {
    if let sqlx::Error::Database(db) = &err {
        if matches!(
            db.code().as_deref(),
            Some(SQLSTATE_SERIALIZATION_FAILURE) | Some(SQLSTATE_DEADLOCK_DETECTED)
        ) {
            return SlotError::Contended;
        }
        if db.is_unique_violation() {
            if let Some(user_id) = user_id {
                return SlotError::DuplicateHolder(user_id);
            }
        }
    }
    SlotError::Store(StoreError(err.to_string()))
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<BookingWithRoom>, StoreError> {
        let row = sqlx::query_as::<_, BookingWithRoomRow>(
            "SELECT b.id, b.user_id, b.room_id, b.created_at, b.updated_at, \
             r.hotel_id, r.name AS room_name, r.capacity \
             FROM bookings b JOIN rooms r ON r.id = b.room_id WHERE b.user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(BookingWithRoom::from))
    }

    async fn insert_if_free_slot(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        room_id: Uuid,
    ) -> Result<(), SlotError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| classify_write_err(e, None))?;

        // Row lock on the room serializes every admission for it; the
        // count below cannot go stale before the insert commits.
        let capacity: Option<(i32,)> =
            sqlx::query_as("SELECT capacity FROM rooms WHERE id = $1 FOR UPDATE")
                .bind(room_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| classify_write_err(e, None))?;
        let Some((capacity,)) = capacity else {
            return Err(SlotError::RoomMissing(room_id));
        };

        let (occupied,): (i64,) =
            sqlx::query_as("SELECT count(*) FROM bookings WHERE room_id = $1")
                .bind(room_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| classify_write_err(e, None))?;
        if occupied >= capacity as i64 {
            return Err(SlotError::SlotsExhausted(room_id));
        }

        sqlx::query(
            "INSERT INTO bookings (id, user_id, room_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4)",
        )
        .bind(booking_id)
        .bind(user_id)
        .bind(room_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| classify_write_err(e, Some(user_id)))?;

        tx.commit()
            .await
            .map_err(|e| classify_write_err(e, Some(user_id)))
    }

    async fn move_if_free_slot(
        &self,
        booking_id: Uuid,
        new_room_id: Uuid,
    ) -> Result<(), SlotError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| classify_write_err(e, None))?;

        let capacity: Option<(i32,)> =
            sqlx::query_as("SELECT capacity FROM rooms WHERE id = $1 FOR UPDATE")
                .bind(new_room_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| classify_write_err(e, None))?;
        let Some((capacity,)) = capacity else {
            return Err(SlotError::RoomMissing(new_room_id));
        };

        // The moved booking does not count against its own destination, so
        // a same-room reassignment never self-blocks.
        let (occupied,): (i64,) =
            sqlx::query_as("SELECT count(*) FROM bookings WHERE room_id = $1 AND id <> $2")
                .bind(new_room_id)
                .bind(booking_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| classify_write_err(e, None))?;
        if occupied >= capacity as i64 {
            return Err(SlotError::SlotsExhausted(new_room_id));
        }

        let updated = sqlx::query(
            "UPDATE bookings SET room_id = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(new_room_id)
        .bind(Utc::now())
        .bind(booking_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify_write_err(e, None))?;
        if updated.rows_affected() == 0 {
            return Err(SlotError::Store(StoreError(format!(
                "booking {booking_id} disappeared during reassignment"
            ))));
        }

        tx.commit().await.map_err(|e| classify_write_err(e, None))
    }
}
