use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use wish_oauth::{
    DEFAULT_STATE_LENGTH, OAuthClient, OAuthError, PkcePair, WishConfig, generate_random_string,
};

#[derive(Debug, Parser)]
#[command(
    name = "wish-oauth",
    about = "Run the OAuth authorization code flow against GitHub or Google, printing JSON."
)]
struct Cli {
    /// TOML file with a `[providers.<key>]` table per provider.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the authorization URL for a provider key.
    Authorize {
        provider: String,
        /// Attach a PKCE challenge and print the verifier to keep.
        #[arg(long)]
        pkce: bool,
        /// Open the URL in the default browser.
        #[arg(long)]
        open: bool,
    },
    /// Redeem a code (or the full callback URL) and print the user profile.
    Complete {
        provider: String,
        code_or_callback_url: String,
        #[arg(long)]
        code_verifier: Option<String>,
    },
    /// Print a fresh PKCE verifier/challenge pair.
    Pkce,
    /// Print a random alphanumeric state value.
    State {
        #[arg(long, default_value_t = DEFAULT_STATE_LENGTH)]
        length: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), OAuthError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => WishConfig::from_path(path)?,
        None => WishConfig::new(),
    };

    match cli.command {
        Command::Authorize {
            provider,
            pkce,
            open,
        } => {
            let client = OAuthClient::new(config)?;
            let request = client.authorization_request_for(&provider, pkce)?;
            if open {
                if let Err(err) = webbrowser::open(&request.authorization_url) {
                    eprintln!("Failed to open browser automatically: {err}");
                }
            }
            print_json(&request)
        }
        Command::Complete {
            provider,
            code_or_callback_url,
            code_verifier,
        } => {
            let client = OAuthClient::new(config)?;
            let flow = client.flow(provider)?;
            let verifier = code_verifier.as_deref();
            let profile = if code_or_callback_url.contains("://") {
                flow.complete_authorization_from_url(&code_or_callback_url, verifier)
                    .await?
            } else {
                match verifier {
                    Some(verifier) => {
                        flow.complete_authorization_with_verifier(&code_or_callback_url, verifier)
                            .await?
                    }
                    None => flow.complete_authorization(&code_or_callback_url).await?,
                }
            };
            print_json(&profile)
        }
        Command::Pkce => print_json(&PkcePair::generate()?),
        Command::State { length } => {
            println!("{}", generate_random_string(length));
            Ok(())
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<(), OAuthError> {
    let output = serde_json::to_string_pretty(value)?;
    println!("{output}");
    Ok(())
}
