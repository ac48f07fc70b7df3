use anyhow::{Context, Result};
use as_auth::TokenValidator;

use crate::cli::{TokenArgs, ValidateAssertionArgs};
use crate::commands::{read_token, token_json};
use crate::config::Settings;
use crate::output::{print_json, print_status};

pub fn token(settings: &Settings, args: &TokenArgs) -> Result<()> {
    let public_key = settings.load_public_key()?;
    let token = read_token(&args.token)?;

    let verified = TokenValidator::system()
        .validate_token(&public_key, &token)
        .context("Token rejected")?;

    print_status(&format!(
        "Token valid for {}",
        verified.claims.subject().unwrap_or("-")
    ));
    print_json(&token_json(&verified.header, &verified.claims))
}

pub fn assertion(settings: &Settings, args: &ValidateAssertionArgs) -> Result<()> {
    let public_key = settings.load_public_key()?;
    let registered = settings.registered_scope_set(&args.registered_scopes);
    if registered.is_empty() {
        anyhow::bail!(
            "No registered scopes. Use --registered-scope or run: as-auth config set registered_scopes \"<scopes>\""
        );
    }
    let token = read_token(&args.token)?;

    let verified = TokenValidator::system()
        .validate_service_assertion(&public_key, &registered, &token)
        .context("Service assertion rejected")?;

    print_status(&format!(
        "Service assertion valid from {}",
        verified.claims.issuer().unwrap_or("-")
    ));
    print_json(&token_json(&verified.header, &verified.claims))
}
