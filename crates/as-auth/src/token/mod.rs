//! Token issuing, signing and validation.
//!
//! - [`claims`] - the claim set carried by every token
//! - [`jws`] - RS512 compact signing and signature verification
//! - [`issuer`] - bearer token and service assertion issuing
//! - [`validator`] - bearer token and service assertion validation
//!
//! The free functions in this module use the system clock and random UUID
//! `jti`s. Use [`TokenIssuer`] and [`TokenValidator`] directly to inject
//! other time and id sources.

pub mod claims;
pub mod issuer;
pub mod jws;
pub mod validator;

pub use claims::{Audience, ClaimSet, ClaimSetBuilder, DecodedToken, VerifiedToken};
pub use issuer::TokenIssuer;
pub use jws::{SignatureError, decode_unverified, sign, verify_signature};
pub use validator::TokenValidator;

use time::Duration;

use crate::AuthResult;
use crate::keys::{PrivateKey, PublicKey};
use crate::scope::ScopeSet;

/// Longest lifetime a bearer token may be issued with, in seconds.
pub const MAX_TOKEN_EXPIRATION_SECS: i64 = 3600;

/// Lifetime of every issued service assertion, in seconds.
pub const SERVICE_ASSERTION_TTL_SECS: i64 = 60;

/// Longest `exp - iat` a service assertion may carry and still validate.
pub const MAX_SERVICE_ASSERTION_TTL: Duration = Duration::minutes(5);

/// How far in the future `iat` may be.
pub const ISSUED_AT_LEEWAY: Duration = Duration::minutes(1);

/// How far in the past `exp` may be.
pub const EXPIRY_LEEWAY: Duration = Duration::seconds(5);

/// Issues a bearer token using the system clock.
///
/// See [`TokenIssuer::issue_token`].
///
/// # Errors
///
/// Returns `InvalidArgument` for empty scopes or an expiration outside
/// `(0, 3600]`, and `Signing` if the signer fails.
pub fn issue_token(
    private_key: &PrivateKey,
    key_id: &str,
    client_id: &str,
    scopes: &ScopeSet,
    expiration_seconds: i64,
) -> AuthResult<String> {
    TokenIssuer::system().issue_token(private_key, key_id, client_id, scopes, expiration_seconds)
}

/// Issues a service assertion using the system clock.
///
/// See [`TokenIssuer::issue_service_assertion`].
///
/// # Errors
///
/// Returns `InvalidArgument` for empty scopes and `Signing` if the signer fails.
pub fn issue_service_assertion(
    private_key: &PrivateKey,
    key_id: &str,
    client_id: &str,
    scopes: &ScopeSet,
) -> AuthResult<String> {
    TokenIssuer::system().issue_service_assertion(private_key, key_id, client_id, scopes)
}

/// Validates a bearer token against the system clock.
///
/// # Errors
///
/// See [`TokenValidator::validate_token`].
pub fn validate_token(public_key: &PublicKey, token: &str) -> AuthResult<VerifiedToken> {
    TokenValidator::system().validate_token(public_key, token)
}

/// Validates a service assertion against the system clock.
///
/// # Errors
///
/// See [`TokenValidator::validate_service_assertion`].
pub fn validate_service_assertion(
    public_key: &PublicKey,
    registered_scopes: &ScopeSet,
    token: &str,
) -> AuthResult<VerifiedToken> {
    TokenValidator::system().validate_service_assertion(public_key, registered_scopes, token)
}
