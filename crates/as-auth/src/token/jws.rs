//! Compact JWS signing and signature verification.
//!
//! Tokens are `base64url(header).base64url(payload).base64url(signature)`
//! signed with RS512 (RSASSA-PKCS1-v1_5 over SHA-512). RS512 is the only
//! accepted algorithm; a header naming anything else is a malformed token,
//! not a signature failure.
//!
//! Verification here covers the signature only. Issuer, audience and
//! lifetime are checked by [`crate::token::validator`].

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, Header, Validation};

use crate::AuthResult;
use crate::error::AuthError;
use crate::keys::{PrivateKey, PublicKey};
use crate::token::claims::{ClaimSet, DecodedToken, VerifiedToken};

/// The only signing algorithm issued or accepted.
pub const ALGORITHM: Algorithm = Algorithm::RS512;

/// Errors from the signature primitive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The token could not be decoded (segments, base64url, JSON, or algorithm).
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The token decoded but the signature does not match the key.
    #[error("signature does not match")]
    Mismatch,
}

impl From<jsonwebtoken::errors::Error> for SignatureError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::Mismatch,
            _ => Self::Malformed(err.to_string()),
        }
    }
}

/// Signs `claims` with RS512, embedding `key_id` as the `kid` header.
///
/// # Errors
///
/// Returns `Signing` if the claims cannot be serialized or the signer fails.
pub fn sign(private_key: &PrivateKey, key_id: &str, claims: &ClaimSet) -> AuthResult<String> {
    let mut header = Header::new(ALGORITHM);
    header.kid = Some(key_id.to_owned());

    jsonwebtoken::encode(&header, claims, private_key.encoding_key())
        .map_err(|e| AuthError::signing(e.to_string()))
}

/// Decodes a token's header and claims WITHOUT verifying its signature.
///
/// Useful to read the `kid` before choosing a verification key.
///
/// # Errors
///
/// Returns `Malformed` if the token does not have three segments, a
/// segment is not base64url, the header or payload is not JSON, or the
/// header algorithm is not RS512.
pub fn decode_unverified(token: &str) -> Result<DecodedToken, SignatureError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, signature] = segments.as_slice() else {
        return Err(SignatureError::Malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    let header: Header = serde_json::from_slice(&decode_segment(header, "header")?)
        .map_err(|e| SignatureError::Malformed(format!("invalid header JSON: {e}")))?;
    if header.alg != ALGORITHM {
        return Err(SignatureError::Malformed(format!(
            "unsupported algorithm {:?}",
            header.alg
        )));
    }

    let claims: ClaimSet = serde_json::from_slice(&decode_segment(payload, "payload")?)
        .map_err(|e| SignatureError::Malformed(format!("invalid payload JSON: {e}")))?;

    decode_segment(signature, "signature")?;

    Ok(DecodedToken { header, claims })
}

/// Verifies a token's RS512 signature and returns its decoded claims.
///
/// Issuer, audience and lifetime are deliberately not checked.
///
/// # Errors
///
/// Returns `Malformed` for structural problems and `Mismatch` if the
/// signature was not produced by the private half of `public_key`.
pub fn verify_signature(public_key: &PublicKey, token: &str) -> Result<VerifiedToken, SignatureError> {
    decode_unverified(token)?;

    let mut validation = Validation::new(ALGORITHM);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<ClaimSet>(token, public_key.decoding_key(), &validation)?;
    Ok(VerifiedToken {
        header: data.header,
        claims: data.claims,
    })
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>, SignatureError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| SignatureError::Malformed(format!("{name} is not valid base64url")))
}
