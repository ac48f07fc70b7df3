pub mod fingerprint;
pub mod inspect;
pub mod issue;
pub mod keygen;
pub mod validate;

use std::io::Read;

use anyhow::{Context, Result};
use as_auth::ClaimSet;
use serde::Serialize;
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Returns the token argument, reading stdin when it is `-`.
pub fn read_token(arg: &str) -> Result<String> {
    read_token_from(arg, std::io::stdin())
}

fn read_token_from(arg: &str, mut input: impl Read) -> Result<String> {
    if arg != "-" {
        return Ok(arg.trim().to_string());
    }
    let mut buf = String::new();
    input
        .read_to_string(&mut buf)
        .context("Failed to read token from stdin")?;
    let token = buf.trim();
    if token.is_empty() {
        anyhow::bail!("No token on stdin");
    }
    Ok(token.to_string())
}

/// JSON view of a token: header, claims, and `iat`/`exp` as RFC 3339.
pub fn token_json(header: &impl Serialize, claims: &ClaimSet) -> Value {
    json!({
        "header": header,
        "claims": claims,
        "issued_at": claims.issued_at().and_then(rfc3339),
        "expires_at": claims.expires_at().and_then(rfc3339),
    })
}

fn rfc3339(instant: OffsetDateTime) -> Option<String> {
    instant.format(&Rfc3339).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_token_argument() {
        assert_eq!(read_token_from(" a.b.c\n", Cursor::new("")).unwrap(), "a.b.c");
    }

    #[test]
    fn test_read_token_from_stdin() {
        let token = read_token_from("-", Cursor::new("a.b.c\n")).unwrap();
        assert_eq!(token, "a.b.c");

        assert!(read_token_from("-", Cursor::new("  \n")).is_err());
    }

    #[test]
    fn test_token_json_times() {
        let claims = ClaimSet {
            iat: Some(0),
            exp: Some(1_700_000_000),
            ..ClaimSet::default()
        };
        let value = token_json(&json!({"alg": "RS512"}), &claims);
        assert_eq!(value["header"]["alg"], "RS512");
        assert_eq!(value["issued_at"], "1970-01-01T00:00:00Z");
        assert_eq!(value["expires_at"], "2023-11-14T22:13:20Z");

        let value = token_json(&json!({}), &ClaimSet::default());
        assert!(value["expires_at"].is_null());
    }
}
