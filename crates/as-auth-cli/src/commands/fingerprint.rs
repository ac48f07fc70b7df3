use std::fs;

use anyhow::{Context, Result};

use crate::cli::FingerprintArgs;

pub fn fingerprint(args: &FingerprintArgs) -> Result<()> {
    let pem = fs::read(&args.pem).with_context(|| format!("Failed to read {}", args.pem.display()))?;
    println!("{}", as_auth::fingerprint(&pem)?);
    Ok(())
}
