//! Binary entrypoint for the Chirpy CLI.
//!
//! Commands:
//! - `start [--bind <addr>]` - run the HTTP server
//! - `init` - create a starter `config.toml` with a random signing secret
//! - `status` - print record counts from the data directory
//! - `hash-password` - interactively hash a password (argon2)
//! - `mint-token --subject <uuid> [--ttl <s>]` - print a signed session token
//! - `check-token <token>` - validate a token and print its subject
//!
//! See the library crate docs for module-level details: `chirpy::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::str::FromStr;
use std::time::Duration;

use chirpy::auth::{CredentialHasher, SessionTokenCodec};
use chirpy::config::Config;
use chirpy::server::ChirpyServer;
use chirpy::storage::Storage;
use chirpy::validation::{parse_id, validate_password};

#[derive(Parser)]
#[command(name = "chirpy")]
#[command(about = "A small HTTP service for posting chirps")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Start {
        /// Override the configured bind address (e.g., 0.0.0.0:8080)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Write a new configuration file with a fresh signing secret
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
    /// Show record counts
    Status,
    /// Hash a password for manual provisioning
    HashPassword,
    /// Issue a session token for a user id
    MintToken {
        /// User id (UUID) to put in the token subject
        #[arg(short, long)]
        subject: String,
        /// Lifetime in seconds (defaults to auth.token_ttl_seconds)
        #[arg(short, long)]
        ttl: Option<u64>,
    },
    /// Validate a session token and print its subject
    CheckToken {
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { bind } => {
            let mut config = Config::load(&cli.config).await?;
            init_logging(Some(&config), cli.verbose);
            info!("Starting Chirpy v{}", env!("CARGO_PKG_VERSION"));
            if let Some(addr) = bind {
                config.server.bind_addr = addr;
                config.validate()?;
            }
            let server = ChirpyServer::new(config).await?;
            server.run().await?;
        }
        Commands::Init { force } => {
            init_logging(None, cli.verbose);
            if !force && tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
                return Err(anyhow!(
                    "{} already exists; pass --force to replace it (this rotates the signing secret)",
                    cli.config
                ));
            }
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
            let config = Config::load(&cli.config).await?;
            Storage::new(&config.storage.data_dir).await?;
            info!("Initialized data directory at {}", config.storage.data_dir);
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(Some(&config), cli.verbose);
            let storage = Storage::new(&config.storage.data_dir).await?;
            let stats = storage.stats().await?;
            println!("Chirpy v{}", env!("CARGO_PKG_VERSION"));
            println!("Bind address: {}", config.server.bind_addr);
            println!("Platform:     {}", config.server.platform);
            println!("Data dir:     {}", config.storage.data_dir);
            println!("Users:        {}", stats.users);
            println!("Chirps:       {}", stats.chirps);
        }
        Commands::HashPassword => {
            let config = Config::load(&cli.config).await.ok();
            init_logging(config.as_ref(), cli.verbose);
            let pass1 = rpassword::prompt_password("Password: ")?;
            if let Err(e) = validate_password(&pass1) {
                println!("Error: {e}");
                return Ok(());
            }
            let pass2 = rpassword::prompt_password("Confirm password: ")?;
            if pass1 != pass2 {
                println!("Error: passwords do not match.");
                return Ok(());
            }
            let argon2 = config
                .as_ref()
                .and_then(|c| c.security.as_ref())
                .and_then(|s| s.argon2.as_ref());
            let hasher = CredentialHasher::from_config(argon2)?;
            let credential = hasher.hash(&pass1)?;
            println!("{}", credential.as_str());
        }
        Commands::MintToken { subject, ttl } => {
            let config = Config::load(&cli.config).await?;
            init_logging(Some(&config), cli.verbose);
            let id = parse_id(&subject)?;
            let codec = SessionTokenCodec::from_config(&config.auth);
            let ttl = ttl.map(Duration::from_secs).unwrap_or(codec.default_ttl());
            println!("{}", codec.issue(id, ttl)?);
        }
        Commands::CheckToken { token } => {
            let config = Config::load(&cli.config).await?;
            init_logging(Some(&config), cli.verbose);
            let codec = SessionTokenCodec::from_config(&config.auth);
            match codec.validate(token.trim()) {
                Ok(id) => println!("valid: subject {}", id),
                Err(e) => {
                    println!("invalid ({}): {}", e.kind(), e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn init_logging(config: Option<&Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let configured = config
        .and_then(|c| log::LevelFilter::from_str(&c.logging.level).ok())
        .unwrap_or(log::LevelFilter::Info);
    let base_level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
    let security_path = config.and_then(|c| c.logging.security_file.clone());

    match log_file {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Foreground runs also echo to the console; redirected output does not
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());

                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }

                if record.target() == "security" {
                    if let Some(ref sec_path) = security_path {
                        if let Ok(mut sf) = std::fs::OpenOptions::new()
                            .create(true)
                            .append(true)
                            .open(sec_path)
                        {
                            let _ = writeln!(sf, "{}", line);
                        }
                    }
                }

                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
