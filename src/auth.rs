/// Admin authentication
///
/// Admins authenticate with a bearer JWT signed (HS256) with the shared
/// secret and carrying `scope = "admin"`. Tokens are issued by the login
/// endpoint in exchange for the configured admin credentials.
use crate::{
    api::middleware::extract_bearer_token,
    config::AuthConfig,
    context::AppContext,
    error::{CmsError, CmsResult},
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Scope value required on admin tokens
pub const ADMIN_SCOPE: &str = "admin";

/// Claims carried by an admin token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub scope: String,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated admin, extracted from the `Authorization` header
#[derive(Debug, Clone)]
pub struct AdminAuth {
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
impl FromRequestParts<AppContext> for AdminAuth {
    type Rejection = CmsError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| CmsError::Authentication("Missing authorization header".to_string()))?;

        let claims = verify_admin_token(&token, &state.config.authentication.jwt_secret)?;

        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| CmsError::Authentication("Invalid token expiry".to_string()))?;

        Ok(AdminAuth {
            username: claims.sub,
            expires_at,
        })
    }
}

/// Verify a JWT token with full validation
///
/// Checks the signature and expiry (with five minutes of clock skew) and
/// requires the admin scope.
pub fn verify_admin_token(token: &str, jwt_secret: &str) -> CmsResult<AdminClaims> {
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 300;

    let token_data = decode::<AdminClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::warn!("JWT verification failed: {}", e);
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                CmsError::Authentication("Token has expired".to_string())
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                CmsError::Authentication("Invalid token signature".to_string())
            }
            _ => CmsError::Authentication(format!("Invalid token: {}", e)),
        }
    })?;

    if token_data.claims.scope != ADMIN_SCOPE {
        return Err(CmsError::Authentication(
            "Token does not have admin scope".to_string(),
        ));
    }

    Ok(token_data.claims)
}

/// Issue an admin token valid for the configured lifetime
pub fn issue_admin_token(
    config: &AuthConfig,
    username: &str,
    now: DateTime<Utc>,
) -> CmsResult<(String, DateTime<Utc>)> {
    let expires_at = now + Duration::hours(config.token_ttl_hours);
    let claims = AdminClaims {
        sub: username.to_string(),
        scope: ADMIN_SCOPE.to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| CmsError::Internal(format!("Failed to sign token: {}", e)))?;

    Ok((token, expires_at))
}

/// Check submitted login credentials against the configured admin account
pub fn check_admin_credentials(config: &AuthConfig, username: &str, password: &str) -> bool {
    // Constant time over fixed-length digests
    let user_ok = digest_eq(username, &config.admin_username);
    let pass_ok = digest_eq(password, &config.admin_password);
    user_ok & pass_ok
}

fn digest_eq(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "correct horse".to_string(),
            token_ttl_hours: 12,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let config = auth_config();
        let (token, expires_at) = issue_admin_token(&config, "admin", Utc::now()).unwrap();

        let claims = verify_admin_token(&token, &config.jwt_secret).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.scope, ADMIN_SCOPE);
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = auth_config();
        let (token, _) = issue_admin_token(&config, "admin", Utc::now()).unwrap();

        let result = verify_admin_token(&token, "another-secret-another-secret-xx");
        assert!(matches!(result, Err(CmsError::Authentication(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = auth_config();
        let issued = Utc::now() - Duration::hours(24);
        let (token, _) = issue_admin_token(&config, "admin", issued).unwrap();

        assert!(verify_admin_token(&token, &config.jwt_secret).is_err());
    }

    #[test]
    fn test_non_admin_scope_rejected() {
        let config = auth_config();
        let now = Utc::now();
        let claims = AdminClaims {
            sub: "visitor".to_string(),
            scope: "read".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(verify_admin_token(&token, &config.jwt_secret).is_err());
    }

    #[test]
    fn test_credentials() {
        let config = auth_config();
        assert!(check_admin_credentials(&config, "admin", "correct horse"));
        assert!(!check_admin_credentials(&config, "admin", "wrong"));
        assert!(!check_admin_credentials(&config, "root", "correct horse"));
    }
}
