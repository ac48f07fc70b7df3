mod cli;
mod commands;
mod config;
mod logging;
mod output;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands, ConfigCommands, IssueCommands, ValidateCommands};
use config::Settings;
use output::print_error;

fn main() {
    if let Err(e) = run() {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = match &cli.global.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };
    let profile = config::load_profile(&config_path, &cli.global.profile)?;
    let settings = Settings::resolve(&cli.global, profile.clone());
    logging::init_tracing(&settings.log_level);
    tracing::debug!(profile = %settings.profile, config = %config_path.display(), "settings resolved");

    match &cli.command {
        Commands::Keygen(args) => commands::keygen::keygen(args)?,
        Commands::Fingerprint(args) => commands::fingerprint::fingerprint(args)?,
        Commands::Issue(args) => match &args.command {
            IssueCommands::Token(args) => commands::issue::token(&settings, args)?,
            IssueCommands::Assertion(args) => commands::issue::assertion(&settings, args)?,
        },
        Commands::Inspect(args) => commands::inspect::inspect(args)?,
        Commands::Validate(args) => match &args.command {
            ValidateCommands::Token(args) => commands::validate::token(&settings, args)?,
            ValidateCommands::Assertion(args) => commands::validate::assertion(&settings, args)?,
        },
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => show_config(&settings, &config_path),
            ConfigCommands::Set(set_args) => {
                let mut cfg = profile;
                cfg.set(&set_args.key, &set_args.value)?;
                config::save_profile(&config_path, &settings.profile, &cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        },
    }

    Ok(())
}

fn show_config(settings: &Settings, config_path: &std::path::Path) {
    let not_set = || "(not set)".to_string();
    let path = |p: &Option<std::path::PathBuf>| p.as_ref().map_or_else(not_set, |p| p.display().to_string());

    println!("{}: {}", "Profile".cyan(), settings.profile);
    println!("{}: {}", "Config file".cyan(), config_path.display());
    println!("{}: {}", "Private key".cyan(), path(&settings.private_key));
    println!("{}: {}", "Public key".cyan(), path(&settings.public_key));
    println!(
        "{}: {}",
        "Key id".cyan(),
        settings.key_id.clone().unwrap_or_else(|| "(public key fingerprint)".to_string())
    );
    println!(
        "{}: {}",
        "Registered scopes".cyan(),
        if settings.registered_scopes.is_empty() {
            not_set()
        } else {
            settings.registered_scopes.join(" ")
        }
    );
    println!("{}: {}s", "Token lifetime".cyan(), settings.expires_in.as_secs());
    println!("{}: {}", "Log level".cyan(), settings.log_level);
}
