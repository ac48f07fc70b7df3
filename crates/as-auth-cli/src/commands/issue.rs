use anyhow::{Context, Result};
use as_auth::{ScopeSet, TokenIssuer};

use crate::cli::{IssueAssertionArgs, IssueTokenArgs};
use crate::config::Settings;

pub fn token(settings: &Settings, args: &IssueTokenArgs) -> Result<()> {
    let private_key = settings.load_private_key()?;
    let key_id = settings.key_id_for(&private_key)?;
    let scopes: ScopeSet = args.scopes.iter().cloned().collect();
    let expires_in = args.expires_in.unwrap_or(settings.expires_in);
    let expiration_seconds =
        i64::try_from(expires_in.as_secs()).context("Token expiration is too large")?;

    let token = TokenIssuer::system()
        .issue_token(&private_key, &key_id, &args.client_id, &scopes, expiration_seconds)
        .context("Failed to issue token")?;
    println!("{token}");
    Ok(())
}

pub fn assertion(settings: &Settings, args: &IssueAssertionArgs) -> Result<()> {
    let private_key = settings.load_private_key()?;
    let key_id = settings.key_id_for(&private_key)?;
    let scopes: ScopeSet = args.scopes.iter().cloned().collect();

    let token = TokenIssuer::system()
        .issue_service_assertion(&private_key, &key_id, &args.client_id, &scopes)
        .context("Failed to issue service assertion")?;
    println!("{token}");
    Ok(())
}
