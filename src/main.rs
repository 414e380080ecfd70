//! Score contract CLI.
//!
//! ```text
//! sibyl keygen                  → keys.json (mnemonic + address)
//! sibyl deploy [--wasm PATH]    → upload + instantiate, prints contract record
//! sibyl query                   → get_score for this account
//! sibyl submit --score N --description TEXT
//! ```
//!
//! Every command except `keygen` is a no-op when no credential exists.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use sibyl_cli::chain::LcdClientFactory;
use sibyl_cli::config::validation::validate_config;
use sibyl_cli::config::{load_or_default, CliConfig, ConfigError};
use sibyl_cli::observability::init_logging;
use sibyl_cli::workflows::interaction::render_score;
use sibyl_cli::workflows::run_keygen;
use sibyl_cli::{BootstrapWorkflow, Identity, InteractionWorkflow, Outcome, WorkflowError};

#[derive(Parser)]
#[command(name = "sibyl")]
#[command(about = "Deploy and interact with the score contract", long_about = None)]
struct Cli {
    /// Configuration file (defaults apply when it does not exist)
    #[arg(short, long, default_value = "sibyl.toml")]
    config: PathBuf,

    /// Override the gateway endpoint
    #[arg(short, long)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a mnemonic and address and write the credential file
    Keygen,
    /// Upload and instantiate the contract
    Deploy {
        /// Contract bytecode to upload
        #[arg(long)]
        wasm: Option<PathBuf>,
    },
    /// Query the score stored for this account
    Query,
    /// Submit a score record
    Submit {
        #[arg(long)]
        score: u64,
        #[arg(long)]
        description: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::debug!(
        endpoint = %config.network.endpoint,
        credentials = %config.paths.credentials.display(),
        "Configuration loaded"
    );

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Workflow failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load(cli: &Cli) -> Result<CliConfig, ConfigError> {
    let mut config = load_or_default(&cli.config)?;
    if let Some(endpoint) = &cli.endpoint {
        config.network.endpoint = endpoint.clone();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }
    Ok(config)
}

async fn run(command: Commands, config: &CliConfig) -> Result<(), WorkflowError> {
    let factory = LcdClientFactory::from_config(config);

    match command {
        Commands::Keygen => {
            // Failures are reported as data; keygen always exits cleanly.
            let data = match run_keygen(config) {
                Ok(credential) => json!(credential),
                Err(message) => json!(message),
            };
            println!("{}", json!({ "data": data }));
        }
        Commands::Deploy { wasm } => {
            let identity = Identity::load(&config.paths.credentials)?;
            let mut workflow = BootstrapWorkflow::new(config, factory);
            if let Some(path) = wasm {
                workflow = workflow.with_bytecode(path);
            }
            if let Outcome::Completed(record) = workflow.run(&identity).await? {
                let text =
                    serde_json::to_string_pretty(&record).map_err(WorkflowError::Encode)?;
                println!("{}", text);
            }
        }
        Commands::Query => {
            let identity = Identity::load(&config.paths.credentials)?;
            let workflow = InteractionWorkflow::new(config, factory);
            if let Outcome::Completed(score) = workflow.query(&identity).await? {
                println!("{}", render_score(&score));
            }
        }
        Commands::Submit { score, description } => {
            let identity = Identity::load(&config.paths.credentials)?;
            let workflow = InteractionWorkflow::new(config, factory);
            if let Outcome::Completed(report) =
                workflow.submit(&identity, score, &description).await?
            {
                if report.recorded {
                    println!("Score Submission Successful!");
                }
            }
        }
    }

    Ok(())
}
