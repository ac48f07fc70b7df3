use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use as_auth::{PrivateKey, PublicKey, ScopeSet};
use serde::{Deserialize, Serialize};

use crate::cli::GlobalArgs;

/// Lifetime of issued bearer tokens when neither a flag nor the profile sets one.
pub const DEFAULT_EXPIRES_IN: Duration = Duration::from_secs(15 * 60);

/// Log level when neither RUST_LOG, a flag, nor the profile sets one.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

const CONFIG_KEYS: &str = "private_key, public_key, key_id, registered_scopes, expires_in, log_level";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub registered_scopes: Vec<String>,
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl ProfileConfig {
    /// Sets one value by its config key. `registered_scopes` takes a
    /// space-separated list.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "private_key" => self.private_key = Some(PathBuf::from(value)),
            "public_key" => self.public_key = Some(PathBuf::from(value)),
            "key_id" => self.key_id = Some(value.to_string()),
            "registered_scopes" => {
                self.registered_scopes = value.split_whitespace().map(str::to_string).collect();
            }
            "expires_in" => {
                let duration = humantime_serde::re::humantime::parse_duration(value)
                    .with_context(|| format!("Invalid duration: {value}"))?;
                self.expires_in = Some(duration);
            }
            "log_level" => self.log_level = Some(value.to_string()),
            other => anyhow::bail!("Unknown config key: {other}. Valid keys: {CONFIG_KEYS}"),
        }
        Ok(())
    }
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

pub fn default_config_path() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".as-auth")
        .join("config.toml"))
}

pub fn load_all(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg: ConfigFile =
        toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(cfg)
}

pub fn load_profile(path: &Path, profile: &str) -> Result<ProfileConfig> {
    let mut all = load_all(path)?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(path: &Path, profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all(path)?;
    all.insert(profile.to_string(), config.clone());
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let content = toml::to_string_pretty(&all)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Effective settings: command-line flags and `AS_AUTH_*` variables first,
/// then the profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub profile: String,
    pub private_key: Option<PathBuf>,
    pub public_key: Option<PathBuf>,
    pub key_id: Option<String>,
    pub registered_scopes: Vec<String>,
    pub expires_in: Duration,
    pub log_level: String,
}

impl Settings {
    pub fn resolve(args: &GlobalArgs, profile: ProfileConfig) -> Self {
        Self {
            profile: args.profile.clone(),
            private_key: args.private_key.clone().or(profile.private_key),
            public_key: args.public_key.clone().or(profile.public_key),
            key_id: args.key_id.clone().or(profile.key_id),
            registered_scopes: profile.registered_scopes,
            expires_in: profile.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            log_level: args
                .log_level
                .clone()
                .or(profile.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    pub fn load_private_key(&self) -> Result<PrivateKey> {
        let path = self.private_key.as_deref().context(
            "No private key configured. Use --private-key, set AS_AUTH_PRIVATE_KEY, or run: as-auth config set private_key <path>",
        )?;
        let pem = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        PrivateKey::from_pem(&pem).with_context(|| format!("Failed to load {}", path.display()))
    }

    pub fn load_public_key(&self) -> Result<PublicKey> {
        let path = self.public_key.as_deref().context(
            "No public key configured. Use --public-key, set AS_AUTH_PUBLIC_KEY, or run: as-auth config set public_key <path>",
        )?;
        let pem = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        PublicKey::from_pem(&pem).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// The configured key id, or the fingerprint of the signing key.
    pub fn key_id_for(&self, private_key: &PrivateKey) -> Result<String> {
        match &self.key_id {
            Some(kid) => Ok(kid.clone()),
            None => Ok(private_key.public_key()?.fingerprint()),
        }
    }

    /// Scopes from the command line, falling back to the profile.
    pub fn registered_scope_set(&self, from_args: &[String]) -> ScopeSet {
        if from_args.is_empty() {
            self.registered_scopes.iter().cloned().collect()
        } else {
            from_args.iter().cloned().collect()
        }
    }
}
