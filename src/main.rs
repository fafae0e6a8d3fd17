use std::path::PathBuf;

use clap::{Parser, Subcommand};
use faq_qa::Result;
use faq_qa::commands::{
    ask, build_index, load_credentials, run_pipeline, show_config, show_status,
};
use faq_qa::config::Config;

#[derive(Parser)]
#[command(name = "faq-qa")]
#[command(about = "Answer questions from an FAQ spreadsheet using embeddings and a hosted LLM")]
#[command(version)]
struct Cli {
    /// Directory holding faq-qa.toml, the FAQ source and the index
    #[arg(long, global = true, default_value = ".")]
    base_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index and answer one question (the default)
    Run {
        /// Question to ask instead of the configured sample question
        #[arg(long)]
        question: Option<String>,
        /// Print the answer and its sources as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rebuild the vector index from the FAQ source
    Index,
    /// Answer a question against the existing index
    Ask {
        /// The question to answer
        question: String,
        /// Print the answer and its sources as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config,
    /// Show index and embedding service status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run {
        question: None,
        json: false,
    });

    match command {
        Commands::Run { question, json } => {
            let credentials = load_credentials()?;
            let config = Config::load(&cli.base_dir)?;
            run_pipeline(&config, credentials, question.as_deref(), json).await?;
        }
        Commands::Index => {
            let config = Config::load(&cli.base_dir)?;
            build_index(&config).await?;
        }
        Commands::Ask { question, json } => {
            let credentials = load_credentials()?;
            let config = Config::load(&cli.base_dir)?;
            ask(&config, credentials, &question, json).await?;
        }
        Commands::Config => {
            show_config(&Config::load(&cli.base_dir)?);
        }
        Commands::Status => {
            show_status(&Config::load(&cli.base_dir)?).await?;
        }
    }

    Ok(())
}
