//! # as-auth
//!
//! Bearer tokens and service assertions for AS Software services.
//!
//! This crate provides:
//! - Signed bearer tokens issued by `auth.as-software.com`
//! - Short-lived, self-issued service-to-service assertions
//! - Validation of both, with strict claim and time-window rules
//! - RSA key parsing, generation and fingerprints
//!
//! ## Overview
//!
//! All tokens are compact JWS signed with RS512. A bearer token names its
//! client in `sub`; a service assertion names its caller in `iss` and is
//! addressed to the AS Software issuer in `aud`. Validation fails fast:
//! the first failing check is reported as an [`AuthError`].
//!
//! ## Modules
//!
//! - [`clock`] - Injectable time and `jti` sources
//! - [`error`] - Error types
//! - [`keys`] - RSA key handles and fingerprints
//! - [`scope`] - Scope sets and the `scope` claim encoding
//! - [`token`] - Token issuing, signing and validation
//!
//! ## Example
//!
//! ```ignore
//! use as_auth::prelude::*;
//!
//! let private_key = PrivateKey::from_pem(&std::fs::read("private.pem")?)?;
//! let public_key = private_key.public_key()?;
//! let scopes: ScopeSet = ["files:read"].into_iter().collect();
//!
//! let token = issue_token(&private_key, &public_key.fingerprint(), "client-1", &scopes, 900)?;
//! let verified = validate_token(&public_key, &token)?;
//! assert_eq!(verified.claims.subject(), Some("client-1"));
//! ```

pub mod clock;
pub mod error;
pub mod keys;
pub mod scope;
pub mod token;

pub use clock::{Clock, FixedClock, IdGenerator, SequentialIds, SystemClock, UuidGenerator};
pub use error::{AuthError, ErrorCategory};
pub use keys::{PrivateKey, PublicKey, fingerprint};
pub use scope::ScopeSet;
pub use token::{
    Audience, ClaimSet, DecodedToken, SignatureError, TokenIssuer, TokenValidator, VerifiedToken,
    issue_service_assertion, issue_token, validate_service_assertion, validate_token,
};

/// Issuer of bearer tokens and audience of service assertions.
pub const AS_SOFTWARE_ISSUER: &str = "auth.as-software.com";

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use as_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::keys::{PrivateKey, PublicKey, fingerprint};
    pub use crate::scope::ScopeSet;
    pub use crate::token::{
        ClaimSet, TokenIssuer, TokenValidator, VerifiedToken, issue_service_assertion,
        issue_token, validate_service_assertion, validate_token,
    };
    pub use crate::{AS_SOFTWARE_ISSUER, AuthResult};
}
