use anyhow::{Context, Result};

use crate::cli::TokenArgs;
use crate::commands::{read_token, token_json};
use crate::output::{print_json, print_warning};

pub fn inspect(args: &TokenArgs) -> Result<()> {
    let token = read_token(&args.token)?;
    let decoded = as_auth::token::decode_unverified(&token).context("Failed to decode token")?;

    print_warning("Signature NOT verified; use `as-auth validate` before trusting these claims");
    print_json(&token_json(&decoded.header, &decoded.claims))
}
