//! Caller identification: warehouse API keys and bearer session tokens.
//!
//! Sessions are minted by the external login service; this module only verifies them.
//! [`issue_session_token`] exists for that service and for tests.

use crate::error::ApiError;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use fhub_domain::config::{ApiConfig, SessionConfig};
use fhub_domain::constants::WAREHOUSE_KEY_HEADER;
use fhub_domain::role::Role;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::debug;

/// JWT claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User code.
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// A verified bearer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_code: String,
    pub role: Role,
}

/// Who is calling. Extracting it rejects unauthenticated requests with `401`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// A warehouse integration presenting a configured API key.
    WarehouseKey,
    Session(Session),
}

impl Caller {
    /// Warehouse keys and warehouse/admin sessions.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        match self {
            Self::WarehouseKey => true,
            Self::Session(session) => session.role.is_staff(),
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::WarehouseKey => None,
            Self::Session(session) => Some(session),
        }
    }

    /// User code of the session, if any.
    #[must_use]
    pub fn user_code(&self) -> Option<&str> {
        self.session().map(|s| s.user_code.as_str())
    }

    /// Name recorded as `entryStaff` on warehouse writes.
    #[must_use]
    pub fn actor(&self) -> &str {
        self.user_code().unwrap_or("warehouse-key")
    }

    /// # Errors
    /// `403` unless the caller is staff.
    pub fn require_staff(&self) -> Result<&Self, ApiError> {
        if self.is_staff() { Ok(self) } else { Err(ApiError::forbidden("Warehouse or admin role required")) }
    }

    /// # Errors
    /// `403` unless the caller holds an admin session.
    pub fn require_admin(&self) -> Result<&Session, ApiError> {
        self.session()
            .filter(|s| s.role == Role::Admin)
            .ok_or_else(|| ApiError::forbidden("Admin role required"))
    }

    /// Returns the user code of a customer session.
    ///
    /// # Errors
    /// `403` for staff sessions and warehouse keys.
    pub fn require_customer(&self) -> Result<&str, ApiError> {
        self.session()
            .filter(|s| s.role == Role::Customer)
            .map(|s| s.user_code.as_str())
            .ok_or_else(|| ApiError::forbidden("Customer session required"))
    }

    /// Returns the session of any role.
    ///
    /// # Errors
    /// `403` for warehouse keys, which carry no identity.
    pub fn require_session(&self) -> Result<&Session, ApiError> {
        self.session().ok_or_else(|| ApiError::forbidden("Session required"))
    }
}

impl<S> FromRequestParts<S> for Caller
where
    ApiConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = ApiConfig::from_ref(state);

        if let Some(value) = parts.headers.get(WAREHOUSE_KEY_HEADER) {
            let presented = value.to_str().unwrap_or_default();
            return if key_matches(&config.security.warehouse_keys, presented) {
                Ok(Self::WarehouseKey)
            } else {
                debug!("Rejected invalid warehouse key");
                Err(ApiError::unauthorized("Invalid warehouse key"))
            };
        }

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing credentials"))?;

        let claims = verify_session_token(&config.security.session, token)?;
        Ok(Self::Session(Session { user_code: claims.sub, role: claims.role }))
    }
}

/// Whether `presented` is one of the configured non-empty keys.
#[must_use]
pub fn key_matches(keys: &[String], presented: &str) -> bool {
    !presented.is_empty()
        && keys
            .iter()
            .filter(|key| !key.trim().is_empty())
            .any(|key| bool::from(key.as_bytes().ct_eq(presented.as_bytes())))
}

/// Mints an HS256 session token valid for `ttl_seconds`.
///
/// # Errors
/// Returns [`ApiError::Internal`] if signing fails.
pub fn issue_session_token(
    config: &SessionConfig,
    user_code: &str,
    role: Role,
) -> Result<String, ApiError> {
    let now = Utc::now().timestamp();
    let ttl = i64::try_from(config.ttl_seconds).unwrap_or(i64::MAX);
    let claims = Claims {
        sub: user_code.to_owned(),
        role,
        iat: now,
        exp: now.saturating_add(ttl),
        iss: config.issuer.clone(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(config.secret.as_bytes()))
        .map_err(|e| ApiError::from(format!("Failed to sign session token: {e}")))
}

/// Verifies signature, issuer and expiry (with clock skew leeway).
///
/// # Errors
/// Returns [`ApiError::Unauthorized`] for any invalid token, and for every token when no
/// secret is configured.
pub fn verify_session_token(config: &SessionConfig, token: &str) -> Result<Claims, ApiError> {
    if !config.has_secret() {
        debug!("Rejected session token: no signing secret configured");
        return Err(ApiError::unauthorized("Invalid or expired session"));
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[config.issuer.as_str()]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.leeway = config.clock_skew_seconds;

    decode::<Claims>(token, &DecodingKey::from_secret(config.secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Rejected session token");
            ApiError::unauthorized("Invalid or expired session")
        })
}
