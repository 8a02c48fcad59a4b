use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use gather_core::hotel::{Hotel, HotelWithRooms, Room};
use gather_core::repository::{HotelRepository, StoreError};

use crate::store_err;

pub struct PostgresHotelRepository {
    pool: PgPool,
}

impl PostgresHotelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct HotelRow {
    id: Uuid,
    name: String,
    image: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<HotelRow> for Hotel {
    fn from(row: HotelRow) -> Self {
        Hotel {
            id: row.id,
            name: row.name,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: Uuid,
    hotel_id: Uuid,
    name: String,
    capacity: i32,
}

impl From<RoomRow> for Room {
    fn from(row: RoomRow) -> Self {
        Room {
            id: row.id,
            hotel_id: row.hotel_id,
            name: row.name,
            capacity: row.capacity,
        }
    }
}

#[async_trait]
impl HotelRepository for PostgresHotelRepository {
    async fn list(&self) -> Result<Vec<Hotel>, StoreError> {
        let rows = sqlx::query_as::<_, HotelRow>(
            "SELECT id, name, image, created_at, updated_at FROM hotels ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(Hotel::from).collect())
    }

    async fn find_with_rooms(&self, hotel_id: Uuid) -> Result<Option<HotelWithRooms>, StoreError> {
        let hotel = sqlx::query_as::<_, HotelRow>(
            "SELECT id, name, image, created_at, updated_at FROM hotels WHERE id = $1",
        )
        .bind(hotel_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        let Some(hotel) = hotel else {
            return Ok(None);
        };

        let rooms = sqlx::query_as::<_, RoomRow>(
            "SELECT id, hotel_id, name, capacity FROM rooms WHERE hotel_id = $1 ORDER BY name",
        )
        .bind(hotel_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(Some(HotelWithRooms {
            hotel: hotel.into(),
            rooms: rooms.into_iter().map(Room::from).collect(),
        }))
    }

    async fn room(&self, room_id: Uuid) -> Result<Option<Room>, StoreError> {
        let row = sqlx::query_as::<_, RoomRow>(
            "SELECT id, hotel_id, name, capacity FROM rooms WHERE id = $1",
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(Room::from))
    }
}
