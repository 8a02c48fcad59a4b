use axum_extra::headers::{authorization::Bearer, Authorization};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Verify the bearer token and extract the caller's user id. Token issuance
/// lives in the identity service, not here.
pub fn authenticate(bearer: &Authorization<Bearer>, secret: &str) -> Result<Uuid, AppError> {
    let token_data = decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::AuthenticationError(e.to_string()))?;

    Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| AppError::AuthenticationError("invalid subject claim".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::headers::Header;
    use jsonwebtoken::{encode, EncodingKey, Header as JwtHeader};

    fn bearer(token: &str) -> Authorization<Bearer> {
        let value = axum::http::HeaderValue::from_str(&format!("Bearer {token}")).unwrap();
        Authorization::decode(&mut [value].iter()).unwrap()
    }

    #[test]
    fn round_trips_a_valid_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(
            &JwtHeader::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let decoded = authenticate(&bearer(&token), "test-secret").unwrap();
        assert_eq!(decoded, user_id);
    }

    #[test]
    fn rejects_a_garbage_token() {
        let err = authenticate(&bearer("12345"), "test-secret").unwrap_err();
        assert!(matches!(err, AppError::AuthenticationError(_)));
    }

    #[test]
    fn rejects_a_token_signed_with_another_secret() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(
            &JwtHeader::default(),
            &claims,
            &EncodingKey::from_secret(b"other-secret"),
        )
        .unwrap();

        let err = authenticate(&bearer(&token), "test-secret").unwrap_err();
        assert!(matches!(err, AppError::AuthenticationError(_)));
    }
}
