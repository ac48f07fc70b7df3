//! Bearer token and service assertion issuing.
//!
//! Preconditions are checked before any signing work is done, so an
//! invalid request never costs an RSA operation.

use crate::AuthResult;
use crate::AS_SOFTWARE_ISSUER;
use crate::clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::error::AuthError;
use crate::keys::PrivateKey;
use crate::scope::ScopeSet;
use crate::token::claims::ClaimSet;
use crate::token::jws;
use crate::token::{MAX_TOKEN_EXPIRATION_SECS, SERVICE_ASSERTION_TTL_SECS};

/// Issues signed bearer tokens and service assertions.
///
/// Holds only the time and id sources; keys are passed per call.
#[derive(Debug, Clone, Default)]
pub struct TokenIssuer<C = SystemClock, G = UuidGenerator> {
    clock: C,
    ids: G,
}

impl TokenIssuer<SystemClock, UuidGenerator> {
    /// Creates an issuer using the system clock and random UUID `jti`s.
    #[must_use]
    pub fn system() -> Self {
        Self::new(SystemClock, UuidGenerator)
    }
}

impl<C: Clock, G: IdGenerator> TokenIssuer<C, G> {
    /// Creates an issuer with explicit time and id sources.
    #[must_use]
    pub fn new(clock: C, ids: G) -> Self {
        Self { clock, ids }
    }

    /// Issues a bearer token for `client_id`.
    ///
    /// The token is issued by the AS Software issuer, has `sub = client_id`,
    /// and expires `expiration_seconds` after issue.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `scopes` is empty or has a scope that
    /// cannot be encoded, or if `expiration_seconds` is not in `(0, 3600]`.
    /// Returns `Signing` if the signer fails.
    pub fn issue_token(
        &self,
        private_key: &PrivateKey,
        key_id: &str,
        client_id: &str,
        scopes: &ScopeSet,
        expiration_seconds: i64,
    ) -> AuthResult<String> {
        scopes.ensure_issuable()?;
        if expiration_seconds <= 0 || expiration_seconds > MAX_TOKEN_EXPIRATION_SECS {
            return Err(AuthError::invalid_argument(format!(
                "Token expiration is invalid: {expiration_seconds}s is not in (0, {MAX_TOKEN_EXPIRATION_SECS}]"
            )));
        }

        let claims = ClaimSet::builder(self.ids.new_id(), self.clock.now())
            .issuer(AS_SOFTWARE_ISSUER)
            .subject(client_id)
            .scopes(scopes)
            .expires_in_seconds(expiration_seconds)
            .build();

        let token = jws::sign(private_key, key_id, &claims)?;
        tracing::debug!(
            kid = key_id,
            jti = claims.jti.as_deref(),
            sub = client_id,
            exp = claims.exp,
            "bearer token issued"
        );
        Ok(token)
    }

    /// Issues a service assertion for `client_id`.
    ///
    /// The assertion is self-issued (`iss = client_id`), addressed to the
    /// AS Software issuer, and always lives exactly 60 seconds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `scopes` is empty or has a scope that
    /// cannot be encoded. Returns `Signing` if the signer fails.
    pub fn issue_service_assertion(
        &self,
        private_key: &PrivateKey,
        key_id: &str,
        client_id: &str,
        scopes: &ScopeSet,
    ) -> AuthResult<String> {
        scopes.ensure_issuable()?;

        let claims = ClaimSet::builder(self.ids.new_id(), self.clock.now())
            .audience(AS_SOFTWARE_ISSUER)
            .issuer(client_id)
            .scopes(scopes)
            .expires_in_seconds(SERVICE_ASSERTION_TTL_SECS)
            .build();

        let token = jws::sign(private_key, key_id, &claims)?;
        tracing::debug!(
            kid = key_id,
            jti = claims.jti.as_deref(),
            iss = client_id,
            "service assertion issued"
        );
        Ok(token)
    }
}
