use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "crm-auth")]
#[command(about = "CRM credential service tooling")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the TOML configuration file
    #[arg(short, long, global = true, env = "CRM_AUTH_CONFIG")]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a claim encryption key for CRM_AUTH_SECRET_KEY
    Keygen(KeygenArgs),
    /// Generate a PKCE verifier/challenge pair
    Pkce,
    /// Check a PKCE verifier against a challenge
    PkceVerify(PkceVerifyArgs),
    /// Load and validate the configuration
    CheckConfig,
    /// Issue, validate and revoke a credential locally
    Smoke(SmokeArgs),
}

impl Commands {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Keygen(_) => "keygen",
            Self::Pkce => "pkce",
            Self::PkceVerify(_) => "pkce-verify",
            Self::CheckConfig => "check-config",
            Self::Smoke(_) => "smoke",
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum KeyEncoding {
    #[default]
    Hex,
    Base64,
}

#[derive(clap::Args)]
pub struct KeygenArgs {
    /// Key encoding
    #[arg(long, default_value = "hex")]
    pub encoding: KeyEncoding,
}

#[derive(clap::Args)]
pub struct PkceVerifyArgs {
    /// Code verifier
    #[arg(long)]
    pub verifier: String,
    /// Code challenge
    #[arg(long)]
    pub challenge: String,
    /// Code challenge method
    #[arg(long, default_value = "S256")]
    pub method: String,
}

#[derive(clap::Args)]
pub struct SmokeArgs {
    /// Credential owner
    #[arg(long, default_value = "smoke-test")]
    pub owner: String,
    /// Granted scopes (repeatable)
    #[arg(long = "scope", default_value = "read")]
    pub scopes: Vec<String>,
    /// Exercise a session bound to this client descriptor instead of a token
    #[arg(long)]
    pub session: Option<String>,
}
