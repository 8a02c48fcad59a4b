use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde::Deserialize;
use uuid::Uuid;

use gather_core::ticket::{Ticket, TicketWithType, TicketType};

use crate::auth::authenticate;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTicketRequest {
    ticket_type_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tickets/types", get(get_ticket_types))
        .route("/tickets", get(get_user_ticket).post(post_ticket))
}

async fn get_ticket_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<TicketType>>, AppError> {
    let ticket_types = state.tickets.list_ticket_types().await?;
    Ok(Json(ticket_types))
}

async fn get_user_ticket(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<TicketWithType>, AppError> {
    let user_id = authenticate(&auth, &state.auth.secret)?;
    let ticket = state.tickets.ticket_for_user(user_id).await?;
    Ok(Json(ticket))
}

async fn post_ticket(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<Json<Ticket>, AppError> {
    let user_id = authenticate(&auth, &state.auth.secret)?;
    let ticket = state
        .tickets
        .create_ticket_for_user(user_id, req.ticket_type_id)
        .await?;
    Ok(Json(ticket))
}
