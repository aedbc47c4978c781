//! Authentication and branch-scoped authorization
//!
//! - [`JwtService`] - token validation (issuance lives in the identity service;
//!   `generate_token` exists for tooling and tests)
//! - [`CurrentUser`] - caller identity extracted from the bearer token
//! - [`AccessPolicy`] - the single branch-scope evaluator

pub mod extractor;
pub mod jwt;
pub mod permissions;
pub mod policy;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use policy::{AccessPolicy, EffectiveScope};
