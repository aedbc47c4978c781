//! HS256 access tokens
//!
//! The server only validates tokens; issuing is kept for tests and tooling.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::permissions::{
    BRANCH_OPERATOR_ROLES, PERMISSION_ALL, ROLE_ADMIN, ROLE_CUSTOMER, ROLE_RIDER,
    get_default_permissions,
};

const DEFAULT_ISSUER: &str = "dispatch-server";
const DEFAULT_AUDIENCE: &str = "dispatch-clients";
const DEFAULT_EXPIRATION_MINUTES: i64 = 24 * 60;
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_minutes: i64,
    pub issuer: String,
    pub audience: String,
    /// Secret was generated for this process because `JWT_SECRET` was
    /// missing or too short; tokens die with the process.
    #[serde(skip)]
    pub ephemeral: bool,
}

impl JwtConfig {
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_minutes: DEFAULT_EXPIRATION_MINUTES,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            ephemeral: false,
        }
    }

    /// `JWT_SECRET`, `JWT_EXPIRATION_MINUTES`, `JWT_ISSUER`, `JWT_AUDIENCE`
    pub fn from_env() -> Self {
        let mut config = match std::env::var("JWT_SECRET") {
            Ok(secret) if secret.len() >= MIN_SECRET_LEN => Self::with_secret(secret),
            other => {
                tracing::warn!(
                    configured = other.is_ok(),
                    "JWT_SECRET missing or shorter than {MIN_SECRET_LEN} chars, using a random secret"
                );
                Self {
                    ephemeral: true,
                    ..Self::with_secret(random_secret())
                }
            }
        };

        if let Some(minutes) = std::env::var("JWT_EXPIRATION_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.expiration_minutes = minutes;
        }
        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            config.issuer = issuer;
        }
        if let Ok(audience) = std::env::var("JWT_AUDIENCE") {
            config.audience = audience;
        }
        config
    }
}

fn random_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    /// admin, manager, staff, rider or customer
    pub role: String,
    /// Home branch; absent for admins and customers
    #[serde(default)]
    pub branch_id: Option<i64>,
    /// Comma-separated; empty means the role defaults
    pub permissions: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    ExpiredToken,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token generation failed: {0}")]
    GenerationFailed(String),
}

#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .field("ephemeral", &self.config.ephemeral)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn with_config(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&config.audience]);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iss", "aud"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }

    pub fn generate_token(
        &self,
        user_id: i64,
        username: &str,
        role: &str,
        branch_id: Option<i64>,
        permissions: &[String],
    ) -> Result<String, JwtError> {
        let issued = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            branch_id,
            permissions: permissions.join(","),
            exp: (issued + Duration::minutes(self.config.expiration_minutes)).timestamp(),
            iat: issued.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            })
    }

    /// Token part of an `Authorization: Bearer <token>` header
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub branch_id: Option<i64>,
    pub permissions: Vec<String>,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// admin, manager or staff
    pub fn is_branch_operator(&self) -> bool {
        BRANCH_OPERATOR_ROLES.contains(&self.role.as_str())
    }

    pub fn is_rider(&self) -> bool {
        self.role == ROLE_RIDER
    }

    pub fn is_customer(&self) -> bool {
        self.role == ROLE_CUSTOMER
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_admin()
            || self
                .permissions
                .iter()
                .any(|p| p == PERMISSION_ALL || p == permission)
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id: i64 = claims
            .sub
            .parse()
            .map_err(|_| JwtError::InvalidToken(format!("subject is not a user id: {}", claims.sub)))?;

        let permissions = match claims.permissions.trim() {
            "" => get_default_permissions(&claims.role),
            listed => listed
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect(),
        };

        Ok(Self {
            id,
            username: claims.username,
            role: claims.role,
            branch_id: claims.branch_id,
            permissions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::with_config(JwtConfig::with_secret(
            "unit-test-secret-key-with-enough-length",
        ))
    }

    fn caller(jwt: &JwtService, token: &str) -> CurrentUser {
        CurrentUser::try_from(jwt.validate_token(token).unwrap()).unwrap()
    }

    #[test]
    fn staff_token_keeps_branch_and_listed_permissions() {
        let jwt = service();
        let token = jwt
            .generate_token(7, "kim", "staff", Some(3), &["orders:discount".to_string()])
            .unwrap();
        let user = caller(&jwt, &token);
        assert_eq!(user.id, 7);
        assert_eq!(user.branch_id, Some(3));
        assert!(user.is_branch_operator());
        assert!(user.has_permission("orders:discount"));
        assert!(!user.has_permission("riders:manage"));
    }

    #[test]
    fn empty_permission_claim_falls_back_to_role_defaults() {
        let jwt = service();
        let token = jwt.generate_token(9, "mo", "manager", Some(1), &[]).unwrap();
        assert!(caller(&jwt, &token).has_permission("riders:manage"));

        let token = jwt.generate_token(1, "root", "admin", None, &[]).unwrap();
        assert!(caller(&jwt, &token).has_permission("anything:at_all"));

        let token = jwt.generate_token(40, "ali", "rider", Some(1), &[]).unwrap();
        let rider = caller(&jwt, &token);
        assert!(rider.is_rider());
        assert!(rider.permissions.is_empty());
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let token = service().generate_token(1, "a", "staff", Some(1), &[]).unwrap();
        let other = JwtService::with_config(JwtConfig::with_secret(
            "a-completely-different-secret-value-xyz",
        ));
        assert!(matches!(
            other.validate_token(&token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let mut config = JwtConfig::with_secret("unit-test-secret-key-with-enough-length");
        config.expiration_minutes = -10;
        let jwt = JwtService::with_config(config);
        let token = jwt.generate_token(2, "x", "staff", Some(1), &[]).unwrap();
        assert!(matches!(jwt.validate_token(&token), Err(JwtError::ExpiredToken)));
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Bearer   "), None);
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }

    #[test]
    fn random_secret_is_long_enough() {
        assert!(random_secret().len() >= MIN_SECRET_LEN);
    }
}
