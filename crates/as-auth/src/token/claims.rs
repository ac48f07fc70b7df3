//! Token claim sets.
//!
//! The same [`ClaimSet`] type describes bearer tokens and service
//! assertions. Every registered claim is optional when decoding so that a
//! missing claim is reported by the validators as a claim error, not as a
//! parse failure.

use jsonwebtoken::Header;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::scope::ScopeSet;

/// Timestamp value treated the same as an absent `iat`/`exp`.
pub const UNSET_TIMESTAMP: i64 = 0;

/// Claims carried in a token payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// JWT ID, unique per issued token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Audience. Service assertions are addressed to the AS Software issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Issuer. The AS Software issuer for bearer tokens, the calling
    /// client for service assertions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Subject (client ID) of a bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Space-separated scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Issued at (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiration time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Any claims not listed above, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClaimSet {
    /// Creates a new builder for a claim set.
    #[must_use]
    pub fn builder(jti: impl Into<String>, issued_at: OffsetDateTime) -> ClaimSetBuilder {
        ClaimSetBuilder::new(jti, issued_at)
    }

    /// Returns the `sub` claim.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref()
    }

    /// Returns the `iss` claim.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.iss.as_deref()
    }

    /// Parses the `scope` claim. Returns an empty set if the claim is absent.
    #[must_use]
    pub fn scopes(&self) -> ScopeSet {
        self.scope
            .as_deref()
            .map(ScopeSet::from_claim)
            .unwrap_or_default()
    }

    /// Returns `iat` as a date-time, if set and representable.
    #[must_use]
    pub fn issued_at(&self) -> Option<OffsetDateTime> {
        self.iat.and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
    }

    /// Returns `exp` as a date-time, if set and representable.
    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.exp.and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
    }
}

/// Builder for `ClaimSet`.
pub struct ClaimSetBuilder {
    claims: ClaimSet,
}

impl ClaimSetBuilder {
    fn new(jti: impl Into<String>, issued_at: OffsetDateTime) -> Self {
        let iat = issued_at.unix_timestamp();
        Self {
            claims: ClaimSet {
                jti: Some(jti.into()),
                iat: Some(iat),
                exp: Some(iat),
                ..ClaimSet::default()
            },
        }
    }

    /// Sets the issuer.
    #[must_use]
    pub fn issuer(mut self, iss: impl Into<String>) -> Self {
        self.claims.iss = Some(iss.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, sub: impl Into<String>) -> Self {
        self.claims.sub = Some(sub.into());
        self
    }

    /// Sets a single audience.
    #[must_use]
    pub fn audience(mut self, aud: impl Into<String>) -> Self {
        self.claims.aud = Some(Audience::Single(aud.into()));
        self
    }

    /// Sets the scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: &ScopeSet) -> Self {
        self.claims.scope = Some(scopes.to_claim());
        self
    }

    /// Sets the expiration time in seconds after `iat`.
    #[must_use]
    pub fn expires_in_seconds(mut self, seconds: i64) -> Self {
        self.claims.exp = self.claims.iat.map(|iat| iat.saturating_add(seconds));
        self
    }

    /// Builds the claim set.
    #[must_use]
    pub fn build(self) -> ClaimSet {
        self.claims
    }
}

/// Audience claim can be a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// Single string audience.
    Single(String),
    /// Array of audience strings.
    Multiple(Vec<String>),
}

impl Audience {
    /// Returns the first audience value.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s.as_str()),
            Self::Multiple(values) => values.first().map(String::as_str),
        }
    }
}

/// A token whose structure was decoded but whose signature was NOT checked.
///
/// Only use this to pick a verification key (via [`DecodedToken::key_id`])
/// or for display. Never make an authorization decision from it.
#[derive(Debug, Clone)]
pub struct DecodedToken {
    /// The token header.
    pub header: Header,
    /// The unverified claims.
    pub claims: ClaimSet,
}

impl DecodedToken {
    /// Returns the `kid` header value.
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.header.kid.as_deref()
    }
}

/// A token whose signature and claims were validated.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    /// The token header.
    pub header: Header,
    /// The verified claims.
    pub claims: ClaimSet,
}

impl VerifiedToken {
    /// Returns the `kid` header value.
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.header.kid.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ts: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(ts).unwrap()
    }

    #[test]
    fn test_builder_bearer_shape() {
        let scopes: ScopeSet = ["files:read", "files:convert"].into_iter().collect();
        let claims = ClaimSet::builder("jti-1", at(1_700_000_000))
            .issuer("auth.as-software.com")
            .subject("client-1")
            .scopes(&scopes)
            .expires_in_seconds(900)
            .build();

        assert_eq!(claims.jti.as_deref(), Some("jti-1"));
        assert_eq!(claims.subject(), Some("client-1"));
        assert_eq!(claims.scope.as_deref(), Some("files:convert files:read"));
        assert_eq!(claims.iat, Some(1_700_000_000));
        assert_eq!(claims.exp, Some(1_700_000_900));
        assert!(claims.aud.is_none());
    }

    #[test]
    fn test_serialization_skips_absent_claims() {
        let claims = ClaimSet::builder("jti-1", at(100))
            .issuer("svc")
            .audience("auth.as-software.com")
            .build();

        let json = serde_json::to_string(&claims).unwrap();
        assert_eq!(
            json,
            r#"{"jti":"jti-1","aud":"auth.as-software.com","iss":"svc","iat":100,"exp":100}"#
        );
        assert!(!json.contains("sub"));
        assert!(!json.contains("scope"));
    }

    #[test]
    fn test_deserialize_missing_claims_and_extras() {
        let claims: ClaimSet =
            serde_json::from_str(r#"{"iss":"x","nbf":5,"custom":"value"}"#).unwrap();
        assert_eq!(claims.issuer(), Some("x"));
        assert!(claims.iat.is_none());
        assert!(claims.exp.is_none());
        assert_eq!(claims.extra.get("custom"), Some(&Value::from("value")));
        assert_eq!(claims.extra.get("nbf"), Some(&Value::from(5)));
    }

    #[test]
    fn test_audience_single_or_array() {
        let claims: ClaimSet = serde_json::from_str(r#"{"aud":"a"}"#).unwrap();
        assert_eq!(claims.aud, Some(Audience::Single("a".to_string())));

        let claims: ClaimSet = serde_json::from_str(r#"{"aud":["b","c"]}"#).unwrap();
        let aud = claims.aud.unwrap();
        assert_eq!(aud.first(), Some("b"));
        assert_eq!(aud, Audience::Multiple(vec!["b".to_string(), "c".to_string()]));

        assert_eq!(Audience::Multiple(vec![]).first(), None);
    }

    #[test]
    fn test_time_accessors() {
        let claims = ClaimSet::builder("j", at(1_000)).expires_in_seconds(60).build();
        assert_eq!(claims.issued_at(), Some(at(1_000)));
        assert_eq!(claims.expires_at(), Some(at(1_060)));

        let claims = ClaimSet {
            exp: Some(i64::MAX),
            ..ClaimSet::default()
        };
        assert_eq!(claims.expires_at(), None);
    }

    #[test]
    fn test_scopes_accessor() {
        let claims = ClaimSet {
            scope: Some("b a".to_string()),
            ..ClaimSet::default()
        };
        assert_eq!(claims.scopes().to_claim(), "a b");
        assert!(ClaimSet::default().scopes().is_empty());
    }
}
