use crate::routes::error::ApiError;
use crate::routes::AppState;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub iss: Option<String>,
}

/// Validates HS256 bearer tokens issued by the external auth service
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Returns the caller's user id
    pub fn verify(&self, token: &str) -> Result<String, ApiError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {}", e)))?;

        if data.claims.sub.is_empty() {
            return Err(ApiError::Unauthorized("Token has no subject".into()));
        }
        Ok(data.claims.sub)
    }
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Authenticated caller, taken from `Authorization: Bearer` or `?token=`
///
/// The query form exists for EventSource clients, which cannot set headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub String);

impl CallerIdentity {
    pub fn user_id(&self) -> &str {
        &self.0
    }
}

fn extract_token(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());
    if bearer.is_some() {
        return bearer;
    }

    web::Query::<TokenQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.into_inner().token)
}

impl FromRequest for CallerIdentity {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            return ready(Err(ApiError::Unauthorized("Token verification not configured".into())));
        };

        let result = match extract_token(req) {
            Some(token) => state.verifier.verify(&token).map(CallerIdentity),
            None => Err(ApiError::Unauthorized("Missing authentication credentials".into())),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, sub: &str, exp_offset: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
            iss: None,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_valid_token() {
        let verifier = TokenVerifier::new("secret", None);
        assert_eq!(verifier.verify(&token("secret", "alice", 3600)).unwrap(), "alice");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = TokenVerifier::new("secret", None);
        assert!(matches!(
            verifier.verify(&token("other", "alice", 3600)),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = TokenVerifier::new("secret", None);
        assert!(verifier.verify(&token("secret", "alice", -3600)).is_err());
    }

    #[test]
    fn test_non_bearer_header_falls_back_to_query_token() {
        let req = actix_web::test::TestRequest::get()
            .uri("/api/v1/notifications?token=abc")
            .insert_header(("Authorization", "Basic xyz"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("abc"));
    }

    #[test]
    fn test_bearer_header_wins_over_query_token() {
        let req = actix_web::test::TestRequest::get()
            .uri("/api/v1/notifications?token=abc")
            .insert_header(("Authorization", "Bearer from-header"))
            .to_http_request();
        assert_eq!(extract_token(&req).as_deref(), Some("from-header"));
    }
}
