use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gather_core::ServiceError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    ValidationError(String),
    Service(ServiceError),
    InternalServerError(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::Service(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Service(err) => match err {
                ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                ServiceError::Forbidden(_) => (StatusCode::FORBIDDEN, err.to_string()),
                // Browse paths deny with 402, booking paths with 403.
                ServiceError::PaymentRequired(_) => {
                    (StatusCode::PAYMENT_REQUIRED, err.to_string())
                }
                ServiceError::RoomFullyBooked => (StatusCode::FORBIDDEN, err.to_string()),
                ServiceError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
                ServiceError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, err.to_string()),
                ServiceError::Store(e) => {
                    tracing::error!("Internal Server Error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal Server Error".to_string(),
                    )
                }
            },
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gather_core::repository::StoreError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn service_errors_map_to_stable_statuses() {
        assert_eq!(
            status_of(AppError::Service(ServiceError::NotFound("room"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Service(ServiceError::Forbidden("nope"))),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AppError::Service(ServiceError::PaymentRequired("unpaid"))),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            status_of(AppError::Service(ServiceError::RoomFullyBooked)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AppError::Service(ServiceError::Conflict("dup".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::Service(ServiceError::Unauthorized("owner"))),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn store_errors_are_masked() {
        let response =
            AppError::Service(ServiceError::Store(StoreError("pg down".into()))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
