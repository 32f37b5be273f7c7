use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Role claim name used by ASP.NET Identity issued tokens.
pub const MS_ROLE_CLAIM: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

pub const ADMIN_ROLE: &str = "admin";

/// Tokens this close to expiry are already treated as expired.
pub const EXPIRY_MARGIN_MINUTES: i64 = 5;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: Option<String>,
}

/// A role claim may be a single string or, with several roles, an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleClaim {
    One(String),
    Many(Vec<String>),
}

impl RoleClaim {
    pub fn contains(&self, role: &str) -> bool {
        match self {
            RoleClaim::One(r) => r == role,
            RoleClaim::Many(roles) => roles.iter().any(|r| r == role),
        }
    }

    pub fn primary(&self) -> Option<&str> {
        match self {
            RoleClaim::One(r) => Some(r.as_str()),
            RoleClaim::Many(roles) => roles.first().map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Option<String>,
    pub exp: Option<i64>,
    pub iat: Option<i64>,
    pub email: Option<String>,
    pub unique_name: Option<String>,
    pub role: Option<RoleClaim>,
    #[serde(rename = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role")]
    pub ms_role: Option<RoleClaim>,
}

impl JwtClaims {
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_ref().is_some_and(|r| r.contains(role))
            || self.ms_role.as_ref().is_some_and(|r| r.contains(role))
    }

    pub fn primary_role(&self) -> Option<String> {
        self.role
            .as_ref()
            .and_then(RoleClaim::primary)
            .or_else(|| self.ms_role.as_ref().and_then(RoleClaim::primary))
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub is_admin: bool,
}

/// The caller's identity, passed explicitly to every backend call.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(exp) => exp - now < Duration::minutes(EXPIRY_MARGIN_MINUTES),
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub user: User,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            authenticated: true,
            user: session.user.clone(),
            expires_at: session.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_expiring_in(minutes: i64) -> Session {
        Session {
            token: "t".to_string(),
            user: User { id: None, name: None, role: None, is_admin: false },
            expires_at: Some(Utc::now() + Duration::minutes(minutes)),
        }
    }

    #[test]
    fn expiry_margin_applies() {
        assert!(session_expiring_in(2).is_expired());
        assert!(session_expiring_in(-10).is_expired());
        assert!(!session_expiring_in(60).is_expired());
    }

    #[test]
    fn role_claim_forms() {
        let claims: JwtClaims = serde_json::from_value(serde_json::json!({
            "sub": "1",
            "http://schemas.microsoft.com/ws/2008/06/identity/claims/role": ["user", "admin"]
        }))
        .unwrap();
        assert!(claims.has_role(ADMIN_ROLE));
        assert_eq!(claims.primary_role().as_deref(), Some("user"));

        let claims: JwtClaims =
            serde_json::from_value(serde_json::json!({ "role": "user" })).unwrap();
        assert!(!claims.has_role(ADMIN_ROLE));
    }
}
