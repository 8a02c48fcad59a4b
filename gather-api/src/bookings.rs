use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gather_core::booking::BookingWithRoom;

use crate::auth::authenticate;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingRequest {
    room_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingResponse {
    booking_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/booking", get(get_booking).post(post_booking))
        .route("/booking/{booking_id}", put(put_booking))
}

async fn get_booking(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<BookingWithRoom>, AppError> {
    let user_id = authenticate(&auth, &state.auth.secret)?;
    let booking = state.reservations.booking_for_user(user_id).await?;
    Ok(Json(booking))
}

async fn post_booking(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<BookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let user_id = authenticate(&auth, &state.auth.secret)?;
    let booking_id = state
        .reservations
        .create_booking(user_id, req.room_id)
        .await?;
    Ok(Json(BookingResponse { booking_id }))
}

async fn put_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<BookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let user_id = authenticate(&auth, &state.auth.secret)?;
    state
        .reservations
        .update_booking(booking_id, req.room_id, user_id)
        .await?;
    Ok(Json(BookingResponse { booking_id }))
}
