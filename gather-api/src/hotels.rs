use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use uuid::Uuid;

use gather_core::hotel::{Hotel, HotelWithRooms};

use crate::auth::authenticate;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/hotels", get(get_hotels))
        .route("/hotels/{hotel_id}", get(get_hotel))
}

async fn get_hotels(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<Hotel>>, AppError> {
    let user_id = authenticate(&auth, &state.auth.secret)?;
    let hotels = state.hotels.hotels(user_id).await?;
    Ok(Json(hotels))
}

async fn get_hotel(
    State(state): State<AppState>,
    Path(hotel_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<HotelWithRooms>, AppError> {
    let user_id = authenticate(&auth, &state.auth.secret)?;
    let hotel = state.hotels.hotel_with_rooms(hotel_id, user_id).await?;
    Ok(Json(hotel))
}
