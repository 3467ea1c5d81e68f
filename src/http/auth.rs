// Bearer-token verification for the REST and WebSocket surfaces.
//
// Tokens are verified here, never issued. A verified token yields a
// UserIdentity; account management lives in another system entirely.

use crate::core::reviews::{UserIdentity, UserRole};
use axum::http::HeaderMap;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required. No token provided.")]
    MissingToken,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Authentication token expired")]
    Expired,

    #[error("Administrator access required")]
    Forbidden,
}

/// HS256 claims as the token issuer writes them. The issuer has used both
/// `id` and `userId` over time, so both spellings are accepted.
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(alias = "userId")]
    id: String,
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
    #[serde(rename = "isActive")]
    is_active: Option<bool>,
    #[allow(dead_code)]
    exp: Option<i64>,
}

#[derive(Clone)]
pub struct AuthConfig {
    key: DecodingKey,
    validation: Validation,
}

impl AuthConfig {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Tokens in the wild do not always carry exp; verify it when present.
        validation.required_spec_claims.clear();
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verifies a raw token and yields the identity it asserts.
    pub fn verify_token(&self, token: &str) -> Result<UserIdentity, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            })?;

        let claims = data.claims;
        if claims.id.trim().is_empty() || claims.is_active == Some(false) {
            return Err(AuthError::InvalidToken);
        }

        let role = match claims.role.as_deref() {
            Some("admin") => UserRole::Admin,
            _ => UserRole::User,
        };

        Ok(UserIdentity {
            id: claims.id,
            name: claims.name.unwrap_or_default(),
            email: claims.email.unwrap_or_default(),
            role,
        })
    }

    /// Extracts and verifies the bearer token from request headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<UserIdentity, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
        self.verify_token(token)
    }

    /// Like `authenticate`, but additionally requires the admin role.
    pub fn require_admin(&self, headers: &HeaderMap) -> Result<UserIdentity, AuthError> {
        let user = self.authenticate(headers)?;
        if !user.is_admin() {
            return Err(AuthError::Forbidden);
        }
        Ok(user)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn token(claims: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        headers
    }

    #[test]
    fn verifies_a_well_formed_admin_token() {
        let auth = AuthConfig::new(SECRET);
        let token = token(json!({
            "id": "admin-1",
            "name": "Mod",
            "email": "mod@example.com",
            "role": "admin",
        }));

        let user = auth.verify_token(&token).unwrap();
        assert_eq!(user.id, "admin-1");
        assert!(user.is_admin());
        assert!(auth.require_admin(&headers_with(&token)).is_ok());
    }

    #[test]
    fn accepts_the_user_id_claim_spelling_and_defaults_to_user_role() {
        let auth = AuthConfig::new(SECRET);
        let token = token(json!({ "userId": "user-1" }));

        let user = auth.verify_token(&token).unwrap();
        assert_eq!(user.id, "user-1");
        assert!(!user.is_admin());
        assert!(matches!(
            auth.require_admin(&headers_with(&token)),
            Err(AuthError::Forbidden)
        ));
    }

    #[test]
    fn rejects_missing_wrong_secret_and_inactive_tokens() {
        let auth = AuthConfig::new(SECRET);

        assert!(matches!(
            auth.authenticate(&HeaderMap::new()),
            Err(AuthError::MissingToken)
        ));

        let forged = encode(
            &Header::default(),
            &json!({ "id": "user-1" }),
            &EncodingKey::from_secret(b"other-secret"),
        )
        .unwrap();
        assert!(matches!(
            auth.verify_token(&forged),
            Err(AuthError::InvalidToken)
        ));

        let inactive = token(json!({ "id": "user-1", "isActive": false }));
        assert!(matches!(
            auth.verify_token(&inactive),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn rejects_expired_tokens_distinctly() {
        let auth = AuthConfig::new(SECRET);
        let expired = token(json!({ "id": "user-1", "exp": 1_000_000_000 }));
        assert!(matches!(auth.verify_token(&expired), Err(AuthError::Expired)));
    }
}
