//! `sessionkit` command line entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::Result;
use sessionkit_cli::commands::{self, SignInArgs, StaticKeychain};
use sessionkit_cli::default_config_path;
use sessionkit_core::AppConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sessionkit")]
#[command(about = "App sign-in for decentralized-identity wallets", long_about = None)]
struct Cli {
    /// Origin of the application signing users in
    #[arg(long, env = "SESSIONKIT_APP_ORIGIN", global = true, default_value = "http://localhost:3000")]
    app_origin: String,

    /// Name of the application
    #[arg(long, env = "SESSIONKIT_APP_NAME", global = true, default_value = "SessionKit")]
    app_name: String,

    /// Wallet configuration file
    #[arg(long, env = "SESSIONKIT_WALLET_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether restoring this wallet should warn about identity reuse
    CheckReuse,
    /// Show whether the app is registered with the wallet
    UsedBefore {
        /// Only check this identity
        #[arg(long)]
        identity_index: Option<u32>,
    },
    /// Build a session record without registering the app
    BuildSession {
        #[command(flatten)]
        keys: KeyArgs,
        /// Identity JSON file (`address`, `defaultUsername`, `profile`)
        identity: PathBuf,
    },
    /// Register the app with an identity if needed and build its session record
    SignIn {
        #[command(flatten)]
        keys: KeyArgs,
        /// Identity JSON file (`address`, `defaultUsername`, `profile`)
        identity: PathBuf,
        /// Identity to sign in with
        #[arg(long, default_value_t = 0)]
        identity_index: u32,
        /// Number of identities in the wallet, used when creating the configuration
        #[arg(long, default_value_t = 1)]
        identity_count: usize,
        /// Write the session record to this file
        #[arg(long)]
        session_out: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct KeyArgs {
    /// Hex encoded app private key
    #[arg(long, env = "SESSIONKIT_APP_PRIVATE_KEY", hide_env_values = true)]
    app_private_key: String,
    /// Signed Gaia association token
    #[arg(long, env = "SESSIONKIT_ASSOCIATION_TOKEN", hide_env_values = true)]
    association_token: String,
}

impl KeyArgs {
    fn keychain(self) -> StaticKeychain {
        StaticKeychain::new(self.app_private_key, self.association_token)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = AppConfig::new(&cli.app_origin, &cli.app_name);
    app.validate()?;
    let config = cli.config.unwrap_or_else(default_config_path);

    let output = match cli.command {
        Commands::CheckReuse => {
            serde_json::to_string_pretty(&commands::check_reuse(&config, &app)?)?
        }
        Commands::UsedBefore { identity_index } => serde_json::to_string_pretty(
            &commands::used_before(&config, identity_index, &app)?,
        )?,
        Commands::BuildSession { keys, identity } => {
            let record = commands::build_session(&identity, &app, &keys.keychain())?;
            record.to_json()?
        }
        Commands::SignIn {
            keys,
            identity,
            identity_index,
            identity_count,
            session_out,
        } => {
            let args = SignInArgs {
                config: &config,
                identity_count,
                identity_index,
                identity: &identity,
                session_out: session_out.as_deref(),
            };
            commands::sign_in(&args, app, &keys.keychain())?.to_json()?
        }
    };

    println!("{output}");
    Ok(())
}
