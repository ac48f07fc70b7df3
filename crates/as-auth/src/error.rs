//! Authentication error types.
//!
//! Every issuing and validation operation reports failures through
//! [`AuthError`]. Validators are fail-fast: the first failing check is the
//! only error returned.

use std::fmt;

/// Errors that can occur while issuing or validating tokens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A precondition was violated before any cryptographic work was done.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the violated precondition.
        message: String,
    },

    /// The compact token is structurally invalid.
    #[error("Malformed token: {message}")]
    MalformedToken {
        /// Description of the structural problem.
        message: String,
    },

    /// The token signature does not verify against the supplied key.
    #[error("Signature invalid: {message}")]
    SignatureInvalid {
        /// Description of the verification failure.
        message: String,
    },

    /// A required claim is absent, empty, unset, or holds an unexpected value.
    #[error("Invalid claim `{claim}`: {message}")]
    InvalidClaim {
        /// Name of the offending claim.
        claim: &'static str,
        /// Description of why the claim was rejected.
        message: String,
    },

    /// The token is outside its validity window or its lifetime is too long.
    #[error("Token not valid at this time: {message}")]
    TimeWindow {
        /// Description of the time-window violation.
        message: String,
    },

    /// The token requests scopes that are not registered.
    #[error("Scope violation: {message}")]
    ScopeViolation {
        /// Description of the scope violation.
        message: String,
    },

    /// Key material could not be parsed, encoded, or generated.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },

    /// The signer failed to produce a token.
    #[error("Failed to sign token: {message}")]
    Signing {
        /// Description of the signing failure.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidArgument` error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a new `MalformedToken` error.
    #[must_use]
    pub fn malformed_token(message: impl Into<String>) -> Self {
        Self::MalformedToken {
            message: message.into(),
        }
    }

    /// Creates a new `SignatureInvalid` error.
    #[must_use]
    pub fn signature_invalid(message: impl Into<String>) -> Self {
        Self::SignatureInvalid {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClaim` error.
    #[must_use]
    pub fn invalid_claim(claim: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidClaim {
            claim,
            message: message.into(),
        }
    }

    /// Creates a new `TimeWindow` error.
    #[must_use]
    pub fn time_window(message: impl Into<String>) -> Self {
        Self::TimeWindow {
            message: message.into(),
        }
    }

    /// Creates a new `ScopeViolation` error.
    #[must_use]
    pub fn scope_violation(message: impl Into<String>) -> Self {
        Self::ScopeViolation {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Creates a new `Signing` error.
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    /// Returns the human readable description without the category prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument { message }
            | Self::MalformedToken { message }
            | Self::SignatureInvalid { message }
            | Self::InvalidClaim { message, .. }
            | Self::TimeWindow { message }
            | Self::ScopeViolation { message }
            | Self::InvalidKey { message }
            | Self::Signing { message } => message,
        }
    }

    /// Returns `true` if this error is a token rejection (as opposed to a
    /// caller or key problem).
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken { .. }
                | Self::SignatureInvalid { .. }
                | Self::InvalidClaim { .. }
                | Self::TimeWindow { .. }
                | Self::ScopeViolation { .. }
        )
    }

    /// Returns `true` if the token may have been forged or tampered with.
    ///
    /// Callers should log these at high severity.
    #[must_use]
    pub fn is_potential_attack(&self) -> bool {
        matches!(self, Self::SignatureInvalid { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument { .. } => ErrorCategory::InvalidArgument,
            Self::MalformedToken { .. } => ErrorCategory::MalformedToken,
            Self::SignatureInvalid { .. } => ErrorCategory::SignatureInvalid,
            Self::InvalidClaim { .. } => ErrorCategory::ClaimMissingOrInvalid,
            Self::TimeWindow { .. } => ErrorCategory::ExpiredOrNotYetValid,
            Self::ScopeViolation { .. } => ErrorCategory::ScopeViolation,
            Self::InvalidKey { .. } => ErrorCategory::Key,
            Self::Signing { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of authentication errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Issuance precondition violated (caller bug).
    InvalidArgument,
    /// Structurally invalid token.
    MalformedToken,
    /// Cryptographic verification failed.
    SignatureInvalid,
    /// A required claim is missing or holds an invalid value.
    ClaimMissingOrInvalid,
    /// Time-window or lifetime violation.
    ExpiredOrNotYetValid,
    /// Requested scopes are not allowed.
    ScopeViolation,
    /// Key material problems.
    Key,
    /// Unexpected internal failures.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid_argument"),
            Self::MalformedToken => write!(f, "malformed_token"),
            Self::SignatureInvalid => write!(f, "signature_invalid"),
            Self::ClaimMissingOrInvalid => write!(f, "claim_missing_or_invalid"),
            Self::ExpiredOrNotYetValid => write!(f, "expired_or_not_yet_valid"),
            Self::ScopeViolation => write!(f, "scope_violation"),
            Self::Key => write!(f, "key"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
