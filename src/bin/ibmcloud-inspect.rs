//! CLI binary for the ibmcloud-inspect crate.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use ibmcloud_inspect::{
    format_export, format_region_list, public_access_message, AccountInspector, Credential,
    InspectError, InspectorConfig, RegionsCommand, DEFAULT_IAM_URL,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ibmcloud-inspect")]
#[command(author, version, about = "Inspect IBM Cloud account settings and regions")]
struct Cli {
    /// Log level for diagnostics on stderr (RUST_LOG takes precedence)
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the regions enabled for the logged-in account
    Regions {
        /// Path to the ibmcloud CLI
        #[arg(long, env = "IBMCLOUD_BIN", default_value = "ibmcloud")]
        ibmcloud_bin: PathBuf,
    },

    /// Check whether public access is enabled for an account
    PublicAccess {
        /// IBM Cloud API key
        #[arg(long, env = "IBMCLOUD_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Account to check (defaults to the account the API key belongs to)
        #[arg(long, env = "IBMCLOUD_ACCOUNT_ID")]
        account_id: Option<String>,

        /// IAM base URL
        #[arg(long, env = "IBMCLOUD_IAM_URL", default_value = DEFAULT_IAM_URL)]
        iam_url: String,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn setup_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.log_level);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<(), InspectError> {
    match command {
        Commands::Regions { ibmcloud_bin } => {
            let names = RegionsCommand::new(ibmcloud_bin).list().await?;

            println!("Enabled IBM Cloud regions:");
            println!("{}", format_region_list(&names));
            println!();
            println!("To export REGIONS envvar:");
            println!("{}", format_export(&names));
            Ok(())
        }

        Commands::PublicAccess {
            api_key,
            account_id,
            iam_url,
            timeout,
        } => {
            let credential = Credential::new(api_key)?;
            let config =
                InspectorConfig::with_iam_url(&iam_url).timeout(Duration::from_secs(timeout));

            println!("Obtaining IAM token...");
            let inspector = AccountInspector::with_config(&config)?
                .authenticate(&credential)
                .await?;
            println!("IBMCLOUD_ACCESS_TOKEN={}", inspector.token().preview());

            let account_id = inspector.resolve_account_id(account_id)?;
            tracing::info!(%account_id, "checking public access");

            let enabled = inspector.public_access_enabled(&account_id).await?;
            println!("{}", public_access_message(enabled));
            Ok(())
        }
    }
}
