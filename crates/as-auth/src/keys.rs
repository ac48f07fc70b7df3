//! RSA key handles and fingerprints.
//!
//! Keys arrive as PEM. Both the PKCS#8/SPKI (`PRIVATE KEY` / `PUBLIC KEY`)
//! and the PKCS#1 (`RSA PRIVATE KEY` / `RSA PUBLIC KEY`) encodings are
//! accepted. Parse failures are [`AuthError::InvalidKey`]: bad key material
//! is a configuration error, never a token validation outcome.
//!
//! ## Example
//!
//! ```ignore
//! use as_auth::keys::{PrivateKey, PublicKey, fingerprint};
//!
//! let private_key = PrivateKey::from_pem(&std::fs::read("private.pem")?)?;
//! let public_key = PublicKey::from_pem(&std::fs::read("public.pem")?)?;
//! let kid = fingerprint(&std::fs::read("public.pem")?)?;
//! ```

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::AuthResult;
use crate::error::AuthError;

/// Modulus size used when no size is requested.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Smallest modulus accepted for generated keys.
pub const MIN_KEY_BITS: usize = 2048;

/// An RSA private key used to sign tokens.
pub struct PrivateKey {
    key: RsaPrivateKey,
    encoding_key: EncodingKey,
}

impl PrivateKey {
    /// Parses a PEM-encoded RSA private key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the data is not UTF-8 PEM or not an RSA
    /// private key in PKCS#8 or PKCS#1 form.
    pub fn from_pem(pem: &[u8]) -> AuthResult<Self> {
        let pem = pem_str(pem)?;
        let key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| AuthError::invalid_key(format!("unreadable RSA private key: {e}")))?;
        Self::from_rsa(key)
    }

    /// Wraps an already constructed RSA private key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the key cannot be DER-encoded.
    pub fn from_rsa(key: RsaPrivateKey) -> AuthResult<Self> {
        let der = key
            .to_pkcs1_der()
            .map_err(|e| AuthError::invalid_key(e.to_string()))?;
        let encoding_key = EncodingKey::from_rsa_der(der.as_bytes());
        Ok(Self { key, encoding_key })
    }

    /// Generates a new RSA private key with a modulus of `bits` bits.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if `bits` is below [`MIN_KEY_BITS`] or generation fails.
    pub fn generate(bits: usize) -> AuthResult<Self> {
        if bits < MIN_KEY_BITS {
            return Err(AuthError::invalid_key(format!(
                "RSA keys must be at least {MIN_KEY_BITS} bits, got {bits}"
            )));
        }
        let key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| AuthError::invalid_key(format!("key generation failed: {e}")))?;
        Self::from_rsa(key)
    }

    /// Derives the matching public key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the public key cannot be DER-encoded.
    pub fn public_key(&self) -> AuthResult<PublicKey> {
        PublicKey::from_rsa(self.key.to_public_key())
    }

    /// Encodes the key as PKCS#8 PEM.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if encoding fails.
    pub fn to_pem(&self) -> AuthResult<String> {
        self.key
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| AuthError::invalid_key(e.to_string()))
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey").field("key", &"[REDACTED]").finish()
    }
}

/// An RSA public key used to verify token signatures.
pub struct PublicKey {
    key: RsaPublicKey,
    spki_der: Vec<u8>,
    decoding_key: DecodingKey,
}

impl PublicKey {
    /// Parses a PEM-encoded RSA public key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the data is not UTF-8 PEM or not an RSA
    /// public key in SPKI or PKCS#1 form.
    pub fn from_pem(pem: &[u8]) -> AuthResult<Self> {
        let pem = pem_str(pem)?;
        let key = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| AuthError::invalid_key(format!("unreadable RSA public key: {e}")))?;
        Self::from_rsa(key)
    }

    /// Wraps an already constructed RSA public key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the key cannot be DER-encoded.
    pub fn from_rsa(key: RsaPublicKey) -> AuthResult<Self> {
        let pkcs1 = key
            .to_pkcs1_der()
            .map_err(|e| AuthError::invalid_key(e.to_string()))?;
        let spki = key
            .to_public_key_der()
            .map_err(|e| AuthError::invalid_key(e.to_string()))?;
        Ok(Self {
            decoding_key: DecodingKey::from_rsa_der(pkcs1.as_bytes()),
            spki_der: spki.as_bytes().to_vec(),
            key,
        })
    }

    /// Returns the key fingerprint: base64 of SHA-256 over the SPKI DER.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        STANDARD.encode(Sha256::digest(&self.spki_der))
    }

    /// Encodes the key as SPKI PEM.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if encoding fails.
    pub fn to_pem(&self) -> AuthResult<String> {
        self.key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| AuthError::invalid_key(e.to_string()))
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Computes the fingerprint of a PEM-encoded RSA public key.
///
/// The result is the standard (padded) base64 encoding of the SHA-256 hash
/// of the key's DER-encoded SubjectPublicKeyInfo. It does not depend on
/// whether the input PEM was SPKI or PKCS#1.
///
/// # Errors
///
/// Returns `InvalidKey` if the PEM cannot be parsed.
pub fn fingerprint(public_key_pem: &[u8]) -> AuthResult<String> {
    PublicKey::from_pem(public_key_pem).map(|key| key.fingerprint())
}

fn pem_str(pem: &[u8]) -> AuthResult<&str> {
    std::str::from_utf8(pem).map_err(|_| AuthError::invalid_key("PEM data is not valid UTF-8"))
}
