//! Bearer token and service assertion validation.
//!
//! Both validators run a fixed sequence of checks and return the first
//! failure. The time window is asymmetric: `iat` may be up to one minute in
//! the future (fast issuer clocks), while `exp` may only be five seconds in
//! the past.

use time::OffsetDateTime;

use crate::AuthResult;
use crate::AS_SOFTWARE_ISSUER;
use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;
use crate::keys::PublicKey;
use crate::scope::ScopeSet;
use crate::token::claims::{ClaimSet, UNSET_TIMESTAMP, VerifiedToken};
use crate::token::jws::{self, SignatureError};
use crate::token::{EXPIRY_LEEWAY, ISSUED_AT_LEEWAY, MAX_SERVICE_ASSERTION_TTL};

/// Which kind of token is being validated; selects the rejection messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Bearer,
    ServiceAssertion,
}

impl TokenKind {
    fn label(self) -> &'static str {
        match self {
            Self::Bearer => "bearer_token",
            Self::ServiceAssertion => "service_assertion",
        }
    }

    fn invalid_signature(self) -> &'static str {
        match self {
            Self::Bearer => "Invalid token signature",
            Self::ServiceAssertion => "Service JWT assertion invalid signature",
        }
    }

    fn missing_iat(self) -> &'static str {
        match self {
            Self::Bearer => "Invalid token iat",
            Self::ServiceAssertion => "Service JWT assertion requires iat",
        }
    }

    fn missing_exp(self) -> &'static str {
        match self {
            Self::Bearer => "Invalid token exp",
            Self::ServiceAssertion => "Service JWT assertion requires exp",
        }
    }

    fn issued_in_future(self) -> &'static str {
        match self {
            Self::Bearer => "Token issued at must be in the past",
            Self::ServiceAssertion => "Service JWT assertion requires iat to be in the past",
        }
    }

    fn expired(self) -> &'static str {
        match self {
            Self::Bearer => "Token is expired",
            Self::ServiceAssertion => "Service JWT assertion is expired",
        }
    }
}

/// `iat`/`exp` of a token that passed the time-window checks.
#[derive(Debug, Clone, Copy)]
struct Lifetime {
    issued_at: i64,
    expires_at: i64,
}

impl Lifetime {
    fn ttl_seconds(self) -> i64 {
        self.expires_at.saturating_sub(self.issued_at)
    }
}

/// Validates bearer tokens and service assertions against an RSA public key.
///
/// Holds only a clock; keys are passed per call. Safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct TokenValidator<C = SystemClock> {
    clock: C,
}

impl TokenValidator<SystemClock> {
    /// Creates a validator that reads the system clock.
    #[must_use]
    pub fn system() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> TokenValidator<C> {
    /// Creates a validator reading time from `clock`.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Validates a bearer token issued by [`crate::token::TokenIssuer::issue_token`].
    ///
    /// # Errors
    ///
    /// Returns the first failing check:
    /// - `MalformedToken` / `SignatureInvalid` if the token does not decode or verify
    /// - `InvalidClaim` if `iss` is not the AS Software issuer, or `iat`/`exp` is unset
    /// - `TimeWindow` if `iat` is more than a minute ahead or `exp` more than
    ///   five seconds behind the current time
    pub fn validate_token(&self, public_key: &PublicKey, token: &str) -> AuthResult<VerifiedToken> {
        let kind = TokenKind::Bearer;
        let verified = verify(kind, public_key, token)?;
        let claims = &verified.claims;

        if claims.issuer() != Some(AS_SOFTWARE_ISSUER) {
            return reject(kind, AuthError::invalid_claim("iss", "Invalid token issuer"));
        }

        if let Err(err) = check_lifetime(kind, claims, self.clock.now()) {
            return reject(kind, err);
        }

        tracing::debug!(
            kind = kind.label(),
            kid = verified.key_id(),
            sub = claims.subject(),
            "token accepted"
        );
        Ok(verified)
    }

    /// Validates a service assertion issued by
    /// [`crate::token::TokenIssuer::issue_service_assertion`].
    ///
    /// Every scope in the assertion must be present in `registered_scopes`.
    ///
    /// # Errors
    ///
    /// Returns the first failing check:
    /// - `MalformedToken` / `SignatureInvalid` if the token does not decode or verify
    /// - `InvalidClaim` if `iss`, `aud`, `iat`, `exp` or `scope` is missing, or
    ///   `aud` is not the AS Software issuer
    /// - `TimeWindow` if the assertion is outside its window or its TTL
    ///   exceeds five minutes
    /// - `ScopeViolation` if it requests unregistered scopes
    pub fn validate_service_assertion(
        &self,
        public_key: &PublicKey,
        registered_scopes: &ScopeSet,
        token: &str,
    ) -> AuthResult<VerifiedToken> {
        let kind = TokenKind::ServiceAssertion;
        let verified = verify(kind, public_key, token)?;

        if let Err(err) = check_assertion_claims(&verified.claims, registered_scopes, self.clock.now()) {
            return reject(kind, err);
        }

        tracing::debug!(
            kind = kind.label(),
            kid = verified.key_id(),
            iss = verified.claims.issuer(),
            "token accepted"
        );
        Ok(verified)
    }
}

fn check_assertion_claims(
    claims: &ClaimSet,
    registered_scopes: &ScopeSet,
    now: OffsetDateTime,
) -> AuthResult<()> {
    let kind = TokenKind::ServiceAssertion;

    if claims.issuer().is_none_or(str::is_empty) {
        return Err(AuthError::invalid_claim(
            "iss",
            "Service JWT assertion requires iss",
        ));
    }

    match claims.aud.as_ref().and_then(|aud| aud.first()) {
        None | Some("") => {
            return Err(AuthError::invalid_claim(
                "aud",
                "Service JWT assertion requires aud",
            ));
        }
        Some(aud) if aud != AS_SOFTWARE_ISSUER => {
            return Err(AuthError::invalid_claim(
                "aud",
                "Service JWT assertion invalid aud",
            ));
        }
        Some(_) => {}
    }

    let lifetime = check_lifetime(kind, claims, now)?;
    if lifetime.ttl_seconds() > MAX_SERVICE_ASSERTION_TTL.whole_seconds() {
        return Err(AuthError::time_window(
            "Service JWT assertions TTL must be 5 minutes or less",
        ));
    }

    let requested = match claims.scope.as_deref() {
        None | Some("") => ScopeSet::new(),
        Some(scope) => ScopeSet::from_claim(scope),
    };
    if requested.is_empty() {
        return Err(AuthError::invalid_claim(
            "scope",
            "Service JWT assertion requires at least one scope",
        ));
    }
    if !requested.is_subset(registered_scopes) {
        let unregistered: Vec<&str> = requested.difference(registered_scopes).collect();
        return Err(AuthError::scope_violation(format!(
            "Service JWT assertion requested unregistered scopes: {}",
            unregistered.join(", ")
        )));
    }

    Ok(())
}

/// Presence and time-window checks shared by both validators.
fn check_lifetime(kind: TokenKind, claims: &ClaimSet, now: OffsetDateTime) -> AuthResult<Lifetime> {
    let issued_at = claims
        .iat
        .filter(|&ts| ts != UNSET_TIMESTAMP)
        .ok_or_else(|| AuthError::invalid_claim("iat", kind.missing_iat()))?;
    let expires_at = claims
        .exp
        .filter(|&ts| ts != UNSET_TIMESTAMP)
        .ok_or_else(|| AuthError::invalid_claim("exp", kind.missing_exp()))?;

    // `iat` is whole seconds, so flooring `now` leaves this comparison exact.
    if issued_at > now.unix_timestamp().saturating_add(ISSUED_AT_LEEWAY.whole_seconds()) {
        return Err(AuthError::time_window(kind.issued_in_future()));
    }
    if is_expired(expires_at, now) {
        return Err(AuthError::time_window(kind.expired()));
    }

    Ok(Lifetime {
        issued_at,
        expires_at,
    })
}

/// Compares `exp` against `now - EXPIRY_LEEWAY` at full precision.
///
/// An `exp` outside the representable range counts as the far end it
/// points to.
fn is_expired(expires_at: i64, now: OffsetDateTime) -> bool {
    let Some(cutoff) = now.checked_sub(EXPIRY_LEEWAY) else {
        return false;
    };
    match OffsetDateTime::from_unix_timestamp(expires_at) {
        Ok(expires_at) => expires_at < cutoff,
        Err(_) => expires_at < 0,
    }
}

fn verify(kind: TokenKind, public_key: &PublicKey, token: &str) -> AuthResult<VerifiedToken> {
    jws::verify_signature(public_key, token).map_err(|err| {
        let context = kind.invalid_signature();
        match err {
            SignatureError::Malformed(cause) => {
                tracing::debug!(kind = kind.label(), %cause, "malformed token rejected");
                AuthError::malformed_token(format!("{context}: {cause}"))
            }
            SignatureError::Mismatch => {
                tracing::warn!(
                    kind = kind.label(),
                    key = %public_key.fingerprint(),
                    "token signature mismatch"
                );
                AuthError::signature_invalid(format!("{context}: {}", SignatureError::Mismatch))
            }
        }
    })
}

fn reject<T>(kind: TokenKind, err: AuthError) -> AuthResult<T> {
    tracing::debug!(kind = kind.label(), category = %err.category(), reason = err.message(), "token rejected");
    Err(err)
}
