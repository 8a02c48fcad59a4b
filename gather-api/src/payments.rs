use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde::Deserialize;
use uuid::Uuid;

use gather_core::ticket::{CardData, Payment};

use crate::auth::authenticate;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentQuery {
    ticket_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessPaymentRequest {
    ticket_id: Uuid,
    card_data: CardData,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", get(get_payment))
        .route("/payments/process", post(process_payment))
}

async fn get_payment(
    State(state): State<AppState>,
    Query(query): Query<PaymentQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Payment>, AppError> {
    let user_id = authenticate(&auth, &state.auth.secret)?;
    let ticket_id = query
        .ticket_id
        .ok_or_else(|| AppError::ValidationError("ticketId not informed".to_string()))?;
    let payment = state.tickets.payment_for_ticket(ticket_id, user_id).await?;
    Ok(Json(payment))
}

async fn process_payment(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<ProcessPaymentRequest>,
) -> Result<Json<Payment>, AppError> {
    let _user_id = authenticate(&auth, &state.auth.secret)?;
    let payment = state
        .tickets
        .record_payment(req.ticket_id, req.card_data)
        .await?;
    Ok(Json(payment))
}
