use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "as-auth")]
#[command(about = "Issue, inspect and validate AS Software tokens")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Settings shared by every command. Each one overrides the profile value.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Config profile name
    #[arg(short, long, global = true, env = "AS_AUTH_PROFILE", default_value = "default")]
    pub profile: String,

    /// Config file (defaults to ~/.as-auth/config.toml)
    #[arg(long, global = true, env = "AS_AUTH_CONFIG")]
    pub config: Option<PathBuf>,

    /// PEM private key used to sign tokens
    #[arg(long, global = true, env = "AS_AUTH_PRIVATE_KEY")]
    pub private_key: Option<PathBuf>,

    /// PEM public key used to validate tokens
    #[arg(long, global = true, env = "AS_AUTH_PUBLIC_KEY")]
    pub public_key: Option<PathBuf>,

    /// Key id written to the token header (defaults to the public key fingerprint)
    #[arg(long, global = true, env = "AS_AUTH_KEY_ID")]
    pub key_id: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "AS_AUTH_LOG")]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new RSA key pair
    Keygen(KeygenArgs),
    /// Print the fingerprint of a public key
    Fingerprint(FingerprintArgs),
    /// Issue a bearer token or service assertion
    Issue(IssueArgs),
    /// Decode a token WITHOUT verifying it
    Inspect(TokenArgs),
    /// Validate a bearer token or service assertion
    Validate(ValidateArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct KeygenArgs {
    /// Directory to write private.pem and public.pem into
    #[arg(long)]
    pub out_dir: PathBuf,
    /// RSA modulus size
    #[arg(long, default_value_t = as_auth::keys::DEFAULT_KEY_BITS)]
    pub bits: usize,
    /// Overwrite existing key files
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args)]
pub struct FingerprintArgs {
    /// Path to a PEM public key
    #[arg(value_name = "PUBLIC_PEM")]
    pub pem: PathBuf,
}

#[derive(clap::Args)]
pub struct IssueArgs {
    #[command(subcommand)]
    pub command: IssueCommands,
}

#[derive(Subcommand)]
pub enum IssueCommands {
    /// Issue a bearer token
    Token(IssueTokenArgs),
    /// Issue a 60 second service assertion
    Assertion(IssueAssertionArgs),
}

#[derive(clap::Args)]
pub struct IssueTokenArgs {
    /// Client the token is issued to (sub)
    #[arg(long)]
    pub client_id: String,
    /// Scope to grant (repeatable)
    #[arg(long = "scope", required = true)]
    pub scopes: Vec<String>,
    /// Token lifetime, e.g. 15m or 1h (at most 1h)
    #[arg(long, env = "AS_AUTH_EXPIRES_IN", value_parser = parse_duration)]
    pub expires_in: Option<Duration>,
}

#[derive(clap::Args)]
pub struct IssueAssertionArgs {
    /// Calling service (iss)
    #[arg(long)]
    pub client_id: String,
    /// Scope to request (repeatable)
    #[arg(long = "scope", required = true)]
    pub scopes: Vec<String>,
}

#[derive(clap::Args)]
pub struct TokenArgs {
    /// Compact token, or - to read it from stdin
    pub token: String,
}

#[derive(clap::Args)]
pub struct ValidateArgs {
    #[command(subcommand)]
    pub command: ValidateCommands,
}

#[derive(Subcommand)]
pub enum ValidateCommands {
    /// Validate a bearer token
    Token(TokenArgs),
    /// Validate a service assertion
    Assertion(ValidateAssertionArgs),
}

#[derive(clap::Args)]
pub struct ValidateAssertionArgs {
    /// Compact token, or - to read it from stdin
    pub token: String,
    /// Scope the caller is registered for (repeatable, overrides the profile).
    /// AS_AUTH_REGISTERED_SCOPES takes a space-separated list.
    #[arg(long = "registered-scope", env = "AS_AUTH_REGISTERED_SCOPES", value_delimiter = ' ')]
    pub registered_scopes: Vec<String>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the resolved settings for the profile
    Show,
    /// Set a profile value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (private_key, public_key, key_id, registered_scopes, expires_in, log_level)
    pub key: String,
    /// Value
    pub value: String,
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_issue_token() {
        let cli = Cli::try_parse_from([
            "as-auth",
            "issue",
            "token",
            "--client-id",
            "client-1",
            "--scope",
            "files:read",
            "--scope",
            "files:write",
            "--expires-in",
            "15m",
        ])
        .unwrap();

        let Commands::Issue(IssueArgs {
            command: IssueCommands::Token(args),
        }) = cli.command
        else {
            panic!("expected issue token");
        };
        assert_eq!(args.client_id, "client-1");
        assert_eq!(args.scopes, ["files:read", "files:write"]);
        assert_eq!(args.expires_in, Some(Duration::from_secs(900)));
    }

    #[test]
    fn test_issue_requires_scope() {
        let result = Cli::try_parse_from(["as-auth", "issue", "assertion", "--client-id", "svc"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::try_parse_from([
            "as-auth",
            "validate",
            "token",
            "abc",
            "--public-key",
            "public.pem",
            "--profile",
            "staging",
        ])
        .unwrap();
        assert_eq!(cli.global.profile, "staging");
        assert_eq!(cli.global.public_key, Some(PathBuf::from("public.pem")));
    }

    fn env_of(path: &[&str], id: &str) -> Option<String> {
        let mut command = Cli::command();
        for name in path {
            command = command.find_subcommand(name).unwrap().clone();
        }
        command
            .get_arguments()
            .find(|arg| arg.get_id() == id)
            .and_then(|arg| arg.get_env())
            .map(|env| env.to_string_lossy().into_owned())
    }

    #[test]
    fn test_settings_read_from_environment() {
        assert_eq!(
            env_of(&["issue", "token"], "expires_in").as_deref(),
            Some("AS_AUTH_EXPIRES_IN")
        );
        assert_eq!(
            env_of(&["validate", "assertion"], "registered_scopes").as_deref(),
            Some("AS_AUTH_REGISTERED_SCOPES")
        );
        assert_eq!(env_of(&[], "private_key").as_deref(), Some("AS_AUTH_PRIVATE_KEY"));
    }

    #[test]
    fn test_registered_scopes_split_on_spaces() {
        let cli = Cli::try_parse_from([
            "as-auth",
            "validate",
            "assertion",
            "abc",
            "--registered-scope",
            "a b",
            "--registered-scope",
            "c",
        ])
        .unwrap();
        let Commands::Validate(ValidateArgs {
            command: ValidateCommands::Assertion(args),
        }) = cli.command
        else {
            panic!("expected validate assertion");
        };
        assert_eq!(args.registered_scopes, ["a", "b", "c"]);
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        assert!(parse_duration("soon").is_err());
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    }
}
