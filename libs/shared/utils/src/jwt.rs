use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{JwtClaims, Session, User, ADMIN_ROLE};
use shared_models::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

fn decode_segment(segment: &str) -> Result<Vec<u8>, ApiError> {
    // Some issuers keep the base64 padding; strip it before decoding.
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| {
            debug!("Failed to decode token segment: {}", e);
            ApiError::NotAuthenticated
        })
}

/// Reads the claims without checking the signature. The clinic backend owns
/// the signing key; the gateway only inspects role and expiry.
pub fn decode_claims(token: &str) -> Result<JwtClaims, ApiError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        debug!("Token does not have three segments");
        return Err(ApiError::NotAuthenticated);
    }

    let claims_bytes = decode_segment(parts[1])?;
    serde_json::from_slice::<JwtClaims>(&claims_bytes).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        ApiError::NotAuthenticated
    })
}

pub fn verify_signature(token: &str, secret: &str) -> Result<(), ApiError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ApiError::NotAuthenticated);
    }

    let signature = decode_segment(parts[2])?;
    let signing_input = format!("{}.{}", parts[0], parts[1]);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| ApiError::NotAuthenticated)?;
    mac.update(signing_input.as_bytes());

    mac.verify_slice(&signature).map_err(|_| {
        debug!("Token signature verification failed");
        ApiError::NotAuthenticated
    })
}

/// Builds the explicit session for a bearer token. Expiry is checked here,
/// with the usual five minute margin.
pub fn session_from_token(token: &str, secret: Option<&str>) -> Result<Session, ApiError> {
    if token.trim().is_empty() {
        return Err(ApiError::NotAuthenticated);
    }

    if let Some(secret) = secret {
        verify_signature(token, secret)?;
    }

    let claims = decode_claims(token)?;

    let expires_at = claims
        .exp
        .and_then(|exp| Utc.timestamp_opt(exp, 0).single());

    let user = User {
        id: claims.sub.clone(),
        name: claims.unique_name.clone().or_else(|| claims.email.clone()),
        role: claims.primary_role(),
        is_admin: claims.has_role(ADMIN_ROLE),
    };

    let session = Session {
        token: token.to_string(),
        user,
        expires_at,
    };

    if session.is_expired() {
        debug!("Token expired at {:?}", session.expires_at);
        return Err(ApiError::SessionExpired);
    }

    debug!("Session established for user {:?}", session.user.id);
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{JwtTestUtils, TestUser};
    use assert_matches::assert_matches;

    const SECRET: &str = "test-secret";

    #[test]
    fn admin_session_from_valid_token() {
        let user = TestUser::admin("vet");
        let token = JwtTestUtils::create_test_token(&user, SECRET, Some(2));

        let session = session_from_token(&token, Some(SECRET)).unwrap();
        assert!(session.is_admin());
        assert_eq!(session.user.id.as_deref(), Some(user.id.as_str()));
        assert_eq!(session.user.name.as_deref(), Some("vet"));
        assert!(session.expires_at.is_some());
    }

    #[test]
    fn ms_role_claim_grants_admin() {
        let token = JwtTestUtils::create_ms_role_token("admin", SECRET);
        let session = session_from_token(&token, None).unwrap();
        assert!(session.is_admin());
        assert_eq!(session.user.role.as_deref(), Some("admin"));
    }

    #[test]
    fn expired_and_nearly_expired_tokens_are_rejected() {
        let user = TestUser::default();
        let expired = JwtTestUtils::create_expired_token(&user, SECRET);
        assert_matches!(session_from_token(&expired, None), Err(ApiError::SessionExpired));

        let closing = JwtTestUtils::create_token_expiring_in_minutes(&user, SECRET, 3);
        assert_matches!(session_from_token(&closing, None), Err(ApiError::SessionExpired));
    }

    #[test]
    fn signature_checked_only_with_secret() {
        let user = TestUser::default();
        let forged = JwtTestUtils::create_invalid_signature_token(&user);

        assert!(session_from_token(&forged, None).is_ok());
        assert_matches!(
            session_from_token(&forged, Some(SECRET)),
            Err(ApiError::NotAuthenticated)
        );
    }

    #[test]
    fn malformed_tokens() {
        assert_matches!(
            session_from_token(&JwtTestUtils::create_malformed_token(), None),
            Err(ApiError::NotAuthenticated)
        );
        assert_matches!(session_from_token("", None), Err(ApiError::NotAuthenticated));
        assert_matches!(session_from_token("only.two", None), Err(ApiError::NotAuthenticated));
    }
}
