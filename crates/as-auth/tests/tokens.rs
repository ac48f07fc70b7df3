//! Integration tests for issuing and validating tokens.
//!
//! Keys are the fixed OpenSSL-generated fixtures under `tests/fixtures/`.

use as_auth::token::{ClaimSet, jws};
use as_auth::{
    AS_SOFTWARE_ISSUER, AuthError, FixedClock, PrivateKey, PublicKey, ScopeSet, SequentialIds,
    TokenIssuer, TokenValidator,
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use time::{Duration, OffsetDateTime};

const NOW: i64 = 1_700_000_000;
const KID: &str = "signing-key";

fn signing_key() -> PrivateKey {
    PrivateKey::from_pem(include_bytes!("fixtures/signing_private.pem")).unwrap()
}

fn verifying_key() -> PublicKey {
    PublicKey::from_pem(include_bytes!("fixtures/signing_public.pem")).unwrap()
}

fn other_verifying_key() -> PublicKey {
    PublicKey::from_pem(include_bytes!("fixtures/other_public.pem")).unwrap()
}

fn scopes(values: &[&str]) -> ScopeSet {
    values.iter().copied().collect()
}

fn issuer() -> TokenIssuer<FixedClock, SequentialIds> {
    TokenIssuer::new(FixedClock::at_unix(NOW), SequentialIds::new("jti"))
}

fn validator_at(unix_seconds: i64) -> TokenValidator<FixedClock> {
    TokenValidator::new(FixedClock::at_unix(unix_seconds))
}

fn at(unix_seconds: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(unix_seconds).unwrap()
}

/// Rewrites the signature segment of `token` with `f` applied to its bytes.
fn tamper_signature(token: &str, f: impl FnOnce(&mut Vec<u8>)) -> String {
    let (signed, signature) = token.rsplit_once('.').unwrap();
    let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();
    f(&mut bytes);
    format!("{signed}.{}", URL_SAFE_NO_PAD.encode(bytes))
}

// =============================================================================
// Bearer tokens
// =============================================================================

#[test]
fn test_bearer_token_round_trip() {
    let requested = scopes(&["files:read", "files:convert"]);
    let token = issuer()
        .issue_token(&signing_key(), KID, "client-1", &requested, 900)
        .unwrap();

    let verified = validator_at(NOW).validate_token(&verifying_key(), &token).unwrap();
    assert_eq!(verified.key_id(), Some(KID));
    assert_eq!(verified.claims.subject(), Some("client-1"));
    assert_eq!(verified.claims.issuer(), Some(AS_SOFTWARE_ISSUER));
    assert_eq!(verified.claims.jti.as_deref(), Some("jti-1"));
    assert_eq!(verified.claims.scopes(), requested);
    assert_eq!(verified.claims.iat, Some(NOW));
    assert_eq!(verified.claims.exp, Some(NOW + 900));
    assert!(verified.claims.aud.is_none());
}

#[test]
fn test_bearer_token_header_and_wire_format() {
    let token = issuer()
        .issue_token(&signing_key(), KID, "client-1", &scopes(&["b", "a"]), 60)
        .unwrap();
    assert_eq!(token.split('.').count(), 3);
    assert!(!token.contains('='));

    let decoded = jws::decode_unverified(&token).unwrap();
    assert_eq!(decoded.header.alg, jws::ALGORITHM);
    assert_eq!(decoded.header.typ.as_deref(), Some("JWT"));
    assert_eq!(decoded.key_id(), Some(KID));
    assert_eq!(decoded.claims.scope.as_deref(), Some("a b"));
}

#[test]
fn test_bearer_token_expiration_bounds() {
    let issuer = issuer();
    let key = signing_key();
    let validator = validator_at(NOW);

    for expiration in [1, 60, 3600] {
        let token = issuer
            .issue_token(&key, KID, "client-1", &scopes(&["a"]), expiration)
            .unwrap();
        let verified = validator.validate_token(&verifying_key(), &token).unwrap();
        assert_eq!(verified.claims.exp, Some(NOW + expiration));
    }

    for expiration in [0, -60, 3601] {
        let err = issuer
            .issue_token(&key, KID, "client-1", &scopes(&["a"]), expiration)
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidArgument { .. }));
    }
}

#[test]
fn test_empty_scopes_produce_no_token() {
    let err = issuer()
        .issue_token(&signing_key(), KID, "client-1", &ScopeSet::new(), 60)
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidArgument { .. }));
    assert_eq!(err.to_string(), "Invalid argument: Token scopes must be specified");

    let err = issuer()
        .issue_service_assertion(&signing_key(), KID, "svc", &ScopeSet::new())
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidArgument { .. }));
}

#[test]
fn test_expiry_leeway_is_five_seconds() {
    let token = issuer()
        .issue_token(&signing_key(), KID, "client-1", &scopes(&["a"]), 60)
        .unwrap();
    let exp = NOW + 60;

    assert!(validator_at(exp + 4).validate_token(&verifying_key(), &token).is_ok());
    assert!(validator_at(exp + 5).validate_token(&verifying_key(), &token).is_ok());

    let err = validator_at(exp + 6)
        .validate_token(&verifying_key(), &token)
        .unwrap_err();
    assert!(matches!(err, AuthError::TimeWindow { .. }));
    assert_eq!(err.message(), "Token is expired");
}

#[test]
fn test_expiry_leeway_counts_sub_seconds() {
    let token = issuer()
        .issue_token(&signing_key(), KID, "client-1", &scopes(&["a"]), 60)
        .unwrap();
    let exp = NOW + 60;

    let clock = FixedClock::at(at(exp + 5) + Duration::milliseconds(900));
    let err = TokenValidator::new(&clock)
        .validate_token(&verifying_key(), &token)
        .unwrap_err();
    assert!(matches!(err, AuthError::TimeWindow { .. }));
    assert_eq!(err.message(), "Token is expired");

    clock.set(at(exp + 4) + Duration::milliseconds(900));
    assert!(TokenValidator::new(&clock)
        .validate_token(&verifying_key(), &token)
        .is_ok());
}

#[test]
fn test_issued_at_leeway_is_one_minute() {
    let token = issuer()
        .issue_token(&signing_key(), KID, "client-1", &scopes(&["a"]), 600)
        .unwrap();

    assert!(validator_at(NOW - 59).validate_token(&verifying_key(), &token).is_ok());

    let err = validator_at(NOW - 61)
        .validate_token(&verifying_key(), &token)
        .unwrap_err();
    assert!(matches!(err, AuthError::TimeWindow { .. }));
    assert_eq!(err.message(), "Token issued at must be in the past");
}

#[test]
fn test_fixed_clock_advances_into_expiry() {
    let clock = FixedClock::at_unix(NOW);
    let token = TokenIssuer::new(&clock, SequentialIds::new("jti"))
        .issue_token(&signing_key(), KID, "client-1", &scopes(&["a"]), 30)
        .unwrap();

    let validator = TokenValidator::new(&clock);
    assert!(validator.validate_token(&verifying_key(), &token).is_ok());

    clock.advance(Duration::seconds(36));
    assert!(matches!(
        validator.validate_token(&verifying_key(), &token),
        Err(AuthError::TimeWindow { .. })
    ));

    clock.reset();
    assert!(validator.validate_token(&verifying_key(), &token).is_ok());
}

#[test]
fn test_wrong_issuer_is_rejected() {
    let claims = ClaimSet::builder("jti-x", at(NOW))
        .issuer("auth.example.com")
        .subject("client-1")
        .scopes(&scopes(&["a"]))
        .expires_in_seconds(60)
        .build();
    let token = jws::sign(&signing_key(), KID, &claims).unwrap();

    let err = validator_at(NOW)
        .validate_token(&verifying_key(), &token)
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidClaim { claim: "iss", .. }));
    assert_eq!(err.message(), "Invalid token issuer");
}

#[test]
fn test_bearer_token_without_lifetime_is_rejected() {
    let mut claims = ClaimSet::builder("jti-x", at(NOW))
        .issuer(AS_SOFTWARE_ISSUER)
        .subject("client-1")
        .expires_in_seconds(60)
        .build();
    claims.iat = None;
    let token = jws::sign(&signing_key(), KID, &claims).unwrap();
    let err = validator_at(NOW)
        .validate_token(&verifying_key(), &token)
        .unwrap_err();
    assert_eq!(err.message(), "Invalid token iat");

    claims.iat = Some(NOW);
    claims.exp = Some(0);
    let token = jws::sign(&signing_key(), KID, &claims).unwrap();
    let err = validator_at(NOW)
        .validate_token(&verifying_key(), &token)
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidClaim { claim: "exp", .. }));
    assert_eq!(err.message(), "Invalid token exp");
}

// =============================================================================
// Signatures
// =============================================================================

#[test]
fn test_flipped_signature_bit_is_rejected() {
    let token = issuer()
        .issue_token(&signing_key(), KID, "client-1", &scopes(&["a"]), 60)
        .unwrap();

    for index in [100, 200, 255] {
        let tampered = tamper_signature(&token, |sig| sig[index] ^= 0x01);
        let err = validator_at(NOW)
            .validate_token(&verifying_key(), &tampered)
            .unwrap_err();
        assert!(
            matches!(err, AuthError::SignatureInvalid { .. }),
            "byte {index}: {err}"
        );
        assert!(err.message().starts_with("Invalid token signature"));
    }
}

#[test]
fn test_tampered_payload_is_rejected() {
    let token = issuer()
        .issue_token(&signing_key(), KID, "client-1", &scopes(&["a"]), 60)
        .unwrap();
    let mut segments: Vec<String> = token.split('.').map(str::to_owned).collect();
    let claims = String::from_utf8(URL_SAFE_NO_PAD.decode(&segments[1]).unwrap()).unwrap();
    segments[1] = URL_SAFE_NO_PAD.encode(claims.replace("\"a\"", "\"admin\""));

    let err = validator_at(NOW)
        .validate_token(&verifying_key(), &segments.join("."))
        .unwrap_err();
    assert!(matches!(err, AuthError::SignatureInvalid { .. }));
}

#[test]
fn test_wrong_key_is_rejected() {
    let token = issuer()
        .issue_token(&signing_key(), KID, "client-1", &scopes(&["a"]), 60)
        .unwrap();

    let err = validator_at(NOW)
        .validate_token(&other_verifying_key(), &token)
        .unwrap_err();
    assert!(matches!(err, AuthError::SignatureInvalid { .. }));
    assert!(err.is_potential_attack());

    let assertion = issuer()
        .issue_service_assertion(&signing_key(), KID, "svc", &scopes(&["a"]))
        .unwrap();
    let err = validator_at(NOW)
        .validate_service_assertion(&other_verifying_key(), &scopes(&["a"]), &assertion)
        .unwrap_err();
    assert!(matches!(err, AuthError::SignatureInvalid { .. }));
    assert!(err.message().starts_with("Service JWT assertion invalid signature"));
}

#[test]
fn test_malformed_tokens_are_rejected() {
    for token in ["", "abc", "a.b", "not.a.token", "a.b.c.d"] {
        let err = validator_at(NOW)
            .validate_token(&verifying_key(), token)
            .unwrap_err();
        assert!(
            matches!(err, AuthError::MalformedToken { .. }),
            "{token:?}: {err}"
        );
        assert!(err.message().starts_with("Invalid token signature"));
    }
}

#[test]
fn test_other_algorithm_is_malformed() {
    let token = issuer()
        .issue_token(&signing_key(), KID, "client-1", &scopes(&["a"]), 60)
        .unwrap();
    let (_, rest) = token.split_once('.').unwrap();
    let header = URL_SAFE_NO_PAD.encode(r#"{"typ":"JWT","alg":"RS256","kid":"signing-key"}"#);

    let err = validator_at(NOW)
        .validate_token(&verifying_key(), &format!("{header}.{rest}"))
        .unwrap_err();
    assert!(matches!(err, AuthError::MalformedToken { .. }));
}

// =============================================================================
// Service assertions
// =============================================================================

fn assertion_with_ttl(ttl_seconds: i64) -> String {
    let claims = ClaimSet::builder("jti-x", at(NOW))
        .audience(AS_SOFTWARE_ISSUER)
        .issuer("converter")
        .scopes(&scopes(&["files:read"]))
        .expires_in_seconds(ttl_seconds)
        .build();
    jws::sign(&signing_key(), KID, &claims).unwrap()
}

#[test]
fn test_service_assertion_round_trip() {
    let requested = scopes(&["files:read"]);
    let token = issuer()
        .issue_service_assertion(&signing_key(), KID, "converter", &requested)
        .unwrap();

    let verified = validator_at(NOW)
        .validate_service_assertion(&verifying_key(), &scopes(&["files:read", "files:write"]), &token)
        .unwrap();
    let claims = &verified.claims;
    assert_eq!(claims.issuer(), Some("converter"));
    assert_eq!(claims.aud.as_ref().and_then(|aud| aud.first()), Some(AS_SOFTWARE_ISSUER));
    assert!(claims.sub.is_none());
    assert_eq!(claims.scopes(), requested);
    assert_eq!(claims.iat, Some(NOW));
    assert_eq!(claims.exp, Some(NOW + 60));
}

#[test]
fn test_service_assertion_lifetime_is_sixty_seconds() {
    let issuer = issuer();
    for _ in 0..3 {
        let token = issuer
            .issue_service_assertion(&signing_key(), KID, "converter", &scopes(&["a"]))
            .unwrap();
        let claims = jws::decode_unverified(&token).unwrap().claims;
        assert_eq!(claims.exp.unwrap() - claims.iat.unwrap(), 60);
    }
}

#[test]
fn test_service_assertion_ttl_ceiling() {
    let registered = scopes(&["files:read"]);

    assert!(validator_at(NOW)
        .validate_service_assertion(&verifying_key(), &registered, &assertion_with_ttl(300))
        .is_ok());

    let err = validator_at(NOW)
        .validate_service_assertion(&verifying_key(), &registered, &assertion_with_ttl(301))
        .unwrap_err();
    assert!(matches!(err, AuthError::TimeWindow { .. }));
    assert_eq!(err.message(), "Service JWT assertions TTL must be 5 minutes or less");
}

#[test]
fn test_service_assertion_unregistered_scopes() {
    let token = issuer()
        .issue_service_assertion(&signing_key(), KID, "converter", &scopes(&["a", "b"]))
        .unwrap();

    let err = validator_at(NOW)
        .validate_service_assertion(&verifying_key(), &scopes(&["a"]), &token)
        .unwrap_err();
    assert!(matches!(err, AuthError::ScopeViolation { .. }));
    assert_eq!(
        err.message(),
        "Service JWT assertion requested unregistered scopes: b"
    );

    let err = validator_at(NOW)
        .validate_service_assertion(&verifying_key(), &ScopeSet::new(), &token)
        .unwrap_err();
    assert!(matches!(err, AuthError::ScopeViolation { .. }));
}

#[test]
fn test_service_assertion_expired() {
    let token = issuer()
        .issue_service_assertion(&signing_key(), KID, "converter", &scopes(&["a"]))
        .unwrap();

    let err = validator_at(NOW + 66)
        .validate_service_assertion(&verifying_key(), &scopes(&["a"]), &token)
        .unwrap_err();
    assert_eq!(err.message(), "Service JWT assertion is expired");
}

#[test]
fn test_bearer_token_is_not_a_service_assertion() {
    let token = issuer()
        .issue_token(&signing_key(), KID, "client-1", &scopes(&["a"]), 60)
        .unwrap();

    // Bearer tokens carry no aud, so the audience gate rejects them.
    let err = validator_at(NOW)
        .validate_service_assertion(&verifying_key(), &scopes(&["a"]), &token)
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidClaim { claim: "aud", .. }));
}

#[test]
fn test_service_assertion_is_not_a_bearer_token() {
    let token = issuer()
        .issue_service_assertion(&signing_key(), KID, "converter", &scopes(&["a"]))
        .unwrap();

    let err = validator_at(NOW)
        .validate_token(&verifying_key(), &token)
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidClaim { claim: "iss", .. }));
}

// =============================================================================
// System providers
// =============================================================================

#[test]
fn test_free_functions_use_system_clock() {
    let token = as_auth::issue_token(&signing_key(), KID, "client-1", &scopes(&["a"]), 60).unwrap();
    let verified = as_auth::validate_token(&verifying_key(), &token).unwrap();
    assert!(uuid_like(verified.claims.jti.as_deref().unwrap()));

    let assertion =
        as_auth::issue_service_assertion(&signing_key(), KID, "converter", &scopes(&["a"])).unwrap();
    assert!(as_auth::validate_service_assertion(&verifying_key(), &scopes(&["a"]), &assertion).is_ok());
}

fn uuid_like(value: &str) -> bool {
    value.len() == 36 && value.chars().filter(|c| *c == '-').count() == 4
}
