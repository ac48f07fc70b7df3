use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use as_auth::PrivateKey;
use colored::Colorize;

use crate::cli::KeygenArgs;
use crate::output::{print_field, print_success};

pub const PRIVATE_KEY_FILE: &str = "private.pem";
pub const PUBLIC_KEY_FILE: &str = "public.pem";

pub fn keygen(args: &KeygenArgs) -> Result<()> {
    let private_path = args.out_dir.join(PRIVATE_KEY_FILE);
    let public_path = args.out_dir.join(PUBLIC_KEY_FILE);
    if !args.force {
        for path in [&private_path, &public_path] {
            if path.exists() {
                anyhow::bail!("{} already exists. Use --force to overwrite", path.display());
            }
        }
    }

    let private_key = PrivateKey::generate(args.bits)?;
    let public_key = private_key.public_key()?;

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    write_private(&private_path, &private_key.to_pem()?)?;
    fs::write(&public_path, public_key.to_pem()?)
        .with_context(|| format!("Failed to write {}", public_path.display()))?;

    print_success(&format!(
        "Wrote {}-bit key pair to {}",
        args.bits,
        args.out_dir.display().to_string().cyan()
    ));
    print_field("Fingerprint", &public_key.fingerprint());
    Ok(())
}

#[cfg(unix)]
fn write_private(path: &Path, pem: &str) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    // `mode` only applies on creation; an overwritten file keeps its old bits.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(pem.as_bytes())?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, pem: &str) -> Result<()> {
    fs::write(path, pem).with_context(|| format!("Failed to write {}", path.display()))
}
