//! Authentication for the RELAY API.
//!
//! Two credential domains, no inheritance between them:
//! 1. Operator session tokens (`Authorization: Bearer <jwt>`), scoped to
//!    the whole command surface: enqueue, get, list, agent management.
//! 2. Agent API keys (`X-API-Key`), scoped to the owning agent's own
//!    commands: poll, output, ack, heartbeat, logout.
//!
//! A request resolves to exactly one [`Principal`]; each route declares
//! which variant it accepts through the extractors in
//! [`crate::middleware`]. Token issuance (login, OAuth) belongs to an
//! external identity service; this module validates tokens and mints them
//! only for ops tooling and tests.

use crate::error::{ApiError, ApiResult};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use relay_core::{AgentId, Clock, SystemClock};
use relay_store::AgentRegistry;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// JWT SECRET (TYPE-SAFE)
// ============================================================================

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

/// Type-safe JWT secret that prevents accidental logging.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Create a new JWT secret. Empty secrets fall back to the insecure
    /// development default, which `validate_for_production` rejects.
    pub fn new(secret: String) -> Self {
        let normalized = if secret.trim().is_empty() {
            INSECURE_DEFAULT_SECRET.to_string()
        } else {
            secret
        };
        Self(SecretString::new(normalized.into()))
    }

    /// Expose the secret value (only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Get the length of the secret without exposing it.
    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    /// Check if the secret is empty without exposing it.
    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    /// Check if the secret is the insecure default.
    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT secret key for signing and verification
    pub jwt_secret: JwtSecret,

    /// JWT algorithm (default: HS256)
    pub jwt_algorithm: Algorithm,

    /// Operator token expiration in seconds (default: 1 hour)
    pub jwt_expiration_secs: i64,

    /// Clock skew tolerance in seconds (default: 60)
    pub jwt_clock_skew_secs: i64,

    /// Clock for token time validation (injected for testing)
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("clock", &"<Clock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: JwtSecret::new(
                std::env::var("RELAY_JWT_SECRET").unwrap_or_default(),
            ),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: 3600,
            jwt_clock_skew_secs: 60,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `RELAY_JWT_SECRET`: operator token signing secret
    /// - `RELAY_JWT_EXPIRATION_SECS`: token expiration (default: 3600)
    /// - `RELAY_JWT_CLOCK_SKEW_SECS`: clock skew tolerance (default: 60)
    pub fn from_env() -> Self {
        Self {
            jwt_secret: JwtSecret::new(
                std::env::var("RELAY_JWT_SECRET").unwrap_or_default(),
            ),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: std::env::var("RELAY_JWT_EXPIRATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600),
            jwt_clock_skew_secs: std::env::var("RELAY_JWT_CLOCK_SKEW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            clock: Arc::new(SystemClock),
        }
    }

    /// Reject insecure defaults when running in production.
    ///
    /// In development the server continues with a logged warning.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        let environment = std::env::var("RELAY_ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase();
        let is_production = environment == "production" || environment == "prod";

        if self.jwt_secret.is_insecure_default() {
            if is_production {
                return Err(ApiError::invalid_input(
                    "Cannot start in production with the insecure default JWT secret. \
                     Set RELAY_JWT_SECRET to a secure value.",
                ));
            }
            tracing::warn!(
                "Using insecure default JWT secret; set RELAY_JWT_SECRET before deploying"
            );
        } else if self.jwt_secret.len() < 32 {
            if is_production {
                return Err(ApiError::invalid_input(format!(
                    "JWT secret is too short for production use ({} chars, minimum 32)",
                    self.jwt_secret.len()
                )));
            }
            tracing::warn!(
                secret_len = self.jwt_secret.len(),
                "JWT secret is short; use at least 32 characters in production"
            );
        }

        Ok(())
    }
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

/// Operator session token claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (operator identifier)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create new claims for an operator using a clock.
    pub fn new(subject: String, expiration_secs: i64, clock: &dyn Clock) -> Self {
        let now = clock.now_epoch_secs();
        Self {
            sub: subject,
            iat: now,
            exp: now + expiration_secs,
        }
    }
}

// ============================================================================
// PRINCIPAL
// ============================================================================

/// The authenticated caller of a request.
///
/// Resolved once per request by the auth middleware and injected into
/// request extensions. Operations accept one variant or the other, never
/// both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Operator with a valid session token; may touch any agent's commands.
    Operator { subject: String },
    /// Agent with a valid API key; may touch only its own commands.
    Agent { agent_id: AgentId },
}

// ============================================================================
// TOKEN VALIDATION
// ============================================================================

/// Validate claim times with our own clock logic.
///
/// Separated from signature validation so tests are deterministic with
/// injected clocks and clock skew policy is explicit.
fn validate_claim_times(now: i64, exp: i64, leeway_secs: i64) -> ApiResult<()> {
    if exp < now - leeway_secs {
        return Err(ApiError::token_expired());
    }
    Ok(())
}

/// Validate an operator session token and extract its claims.
///
/// Performs signature validation only via `jsonwebtoken`, then applies
/// time validation with the injected clock.
pub fn validate_operator_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose().as_bytes());

    let mut validation = Validation::new(config.jwt_algorithm);
    validation.validate_exp = false; // done below with our clock
    validation.validate_nbf = false;
    validation.required_spec_claims = std::collections::HashSet::from(["exp".to_string()]);

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidToken => {
                ApiError::invalid_token("Token is invalid")
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::invalid_token("Token signature is invalid")
            }
            _ => ApiError::invalid_token(format!("Token validation failed: {}", e)),
        })?;

    let claims = token_data.claims;
    let now = config.clock.now_epoch_secs();
    validate_claim_times(now, claims.exp, config.jwt_clock_skew_secs)?;

    Ok(claims)
}

/// Mint an operator session token.
///
/// Issuance flows (login, OAuth) live in the collaborator identity
/// service; this exists for ops tooling and tests.
pub fn mint_operator_token(config: &AuthConfig, subject: String) -> ApiResult<String> {
    let claims = Claims::new(subject, config.jwt_expiration_secs, &*config.clock);
    let encoding_key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    let header = Header::new(config.jwt_algorithm);

    encode(&header, &claims, &encoding_key)
        .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
}

// ============================================================================
// REQUEST AUTHENTICATION
// ============================================================================

/// Resolve a request's credentials to a [`Principal`].
///
/// `X-API-Key` is checked first (agent domain), then `Authorization:
/// Bearer` (operator domain). A request carrying neither, or a credential
/// that fails its domain's validation, is unauthenticated.
pub fn authenticate(
    config: &AuthConfig,
    registry: &AgentRegistry,
    api_key_header: Option<&str>,
    auth_header: Option<&str>,
) -> ApiResult<Principal> {
    if let Some(api_key) = api_key_header {
        let agent = registry.resolve_key(api_key).map_err(ApiError::from)?;
        return Ok(Principal::Agent { agent_id: agent.id });
    }

    if let Some(auth_value) = auth_header {
        let token = auth_value.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::invalid_token("Authorization header must use Bearer scheme")
        })?;
        let claims = validate_operator_token(config, token)?;
        return Ok(Principal::Operator {
            subject: claims.sub,
        });
    }

    Err(ApiError::unauthorized(
        "Authentication required: provide X-API-Key or Authorization header",
    ))
}

// ============================================================================
// TESTS
// ============================================================================
