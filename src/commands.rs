use console::style;
use tracing::{info, warn};

use crate::answerer::{Answer, QaChain};
use crate::config::{API_KEY_ENV, Config, Credentials};
use crate::embeddings::{Embedder, OllamaClient};
use crate::indexer::{IndexReport, Indexer};
use crate::llm::{GeminiClient, LanguageModel};
use crate::prompt::PromptTemplate;
use crate::retriever::Retriever;
use crate::vector_store::{VectorIndex, VectorStore, read_manifest};
use crate::{FaqError, Result};

/// Read the language model credential, failing before any other work is done
#[inline]
pub fn load_credentials() -> Result<Credentials> {
    Credentials::from_env().map_err(|e| FaqError::Config(e.to_string()))
}

/// Rebuild the vector index from the configured FAQ source
#[inline]
pub async fn build_index(config: &Config) -> Result<IndexReport> {
    let embedder = OllamaClient::new(&config.ollama)?.with_progress(true);
    let report = Indexer::new(embedder, config).build().await?;

    print_index_report(&report);
    Ok(report)
}

/// Answer one question against the existing index and print the result
#[inline]
pub async fn ask(
    config: &Config,
    credentials: Credentials,
    question: &str,
    json: bool,
) -> Result<Answer> {
    let store = VectorStore::open(&config.index_path()).await?;
    store.ensure_embedding_model(&config.ollama.model)?;

    let embedder = OllamaClient::new(&config.ollama)?;
    let model = GeminiClient::new(&config.llm, credentials)?;

    let answer = answer_question(config, embedder, store, model, question).await?;
    print_answer(&answer, json)?;
    Ok(answer)
}

/// Rebuild the index and then answer `question`, or the configured sample question
#[inline]
pub async fn run_pipeline(
    config: &Config,
    credentials: Credentials,
    question: Option<&str>,
    json: bool,
) -> Result<Answer> {
    build_index(config).await?;

    let question = question.unwrap_or(config.answer.sample_question.as_str());
    info!("Answering: {}", question);
    ask(config, credentials, question, json).await
}

/// Wire a retriever, the configured prompt and a language model into one answer
#[inline]
pub async fn answer_question<E, I, L>(
    config: &Config,
    embedder: E,
    index: I,
    model: L,
    question: &str,
) -> Result<Answer>
where
    E: Embedder,
    I: VectorIndex,
    L: LanguageModel,
{
    let template = PromptTemplate::new(config.answer.prompt_template.as_str())
        .map_err(|e| FaqError::Config(e.to_string()))?;
    let retriever = Retriever::new(embedder, index, &config.retrieval);

    QaChain::new(retriever, template, model)
        .answer(question)
        .await
}

/// Print an answer to stdout, either for people or as JSON
#[inline]
pub fn print_answer(answer: &Answer, json: bool) -> Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(answer)
            .map_err(|e| FaqError::Other(anyhow::Error::new(e)))?;
        println!("{}", rendered);
        return Ok(());
    }

    println!("{}", answer.text);

    if answer.source_documents.is_empty() {
        eprintln!("{}", style("No matching FAQ entries").dim());
        return Ok(());
    }

    eprintln!();
    eprintln!("{}", style("Sources:").bold().yellow());
    for scored in &answer.source_documents {
        eprintln!(
            "  [{}] row {}: {}",
            style(format!("{:.3}", scored.score)).cyan(),
            scored.document.row,
            scored.document.source
        );
    }

    Ok(())
}

fn print_index_report(report: &IndexReport) {
    eprintln!(
        "{} Indexed {} documents ({} dimensions) in {:.2}s",
        style("✓").green(),
        report.documents,
        report.dimension,
        report.elapsed.as_secs_f64()
    );
    if !report.skipped_rows.is_empty() {
        eprintln!(
            "  {} rows skipped for an empty key: {:?}",
            style(report.skipped_rows.len()).yellow(),
            report.skipped_rows
        );
    }
    eprintln!("  Index: {}", style(report.index_path.display()).dim());
}

/// Print the effective configuration; the credential is never shown
#[inline]
pub fn show_config(config: &Config) {
    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Source:").bold().yellow());
    eprintln!("  Path: {}", style(config.source_path().display()).cyan());
    eprintln!("  Encoding: {}", style(&config.source.encoding).cyan());
    eprintln!("  Key Column: {}", style(&config.source.key_column).cyan());
    eprintln!("  Delimiter: {:?}", config.source.delimiter);

    eprintln!();
    eprintln!("{}", style("Index:").bold().yellow());
    eprintln!("  Path: {}", style(config.index_path().display()).cyan());
    eprintln!("  Table: {}", style(&config.index.table).cyan());

    eprintln!();
    eprintln!("{}", style("Ollama Settings:").bold().yellow());
    match config.ollama.ollama_url() {
        Ok(url) => eprintln!("  URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  URL: {} ({})", style("Invalid").red(), e),
    }
    eprintln!("  Model: {}", style(&config.ollama.model).cyan());
    eprintln!("  Batch Size: {}", style(config.ollama.batch_size).cyan());

    eprintln!();
    eprintln!("{}", style("Language Model:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.llm.base_url).cyan());
    eprintln!("  Model: {}", style(&config.llm.model).cyan());
    eprintln!("  Temperature: {}", style(config.llm.temperature).cyan());
    let credential = if std::env::var_os(API_KEY_ENV).is_some() {
        style("set").green()
    } else {
        style("not set").red()
    };
    eprintln!("  {}: {}", API_KEY_ENV, credential);

    eprintln!();
    eprintln!("{}", style("Retrieval:").bold().yellow());
    eprintln!("  Top K: {}", style(config.retrieval.top_k).cyan());
    eprintln!(
        "  Score Threshold: {}",
        style(config.retrieval.score_threshold).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );
}

/// Report on the persisted index and the embedding service
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    println!("📊 FAQ Index Status");
    println!("{}", "=".repeat(50));
    println!();

    println!("🔍 Index:");
    let index_path = config.index_path();
    match read_manifest(&index_path) {
        Ok(manifest) => {
            println!("   Path: {}", index_path.display());
            println!("   Source: {}", manifest.source.display());
            println!("   Embedding Model: {}", manifest.embedding_model);
            println!("   Dimension: {}", manifest.dimension);
            println!(
                "   Built: {}",
                manifest.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            if manifest.embedding_model != config.ollama.model {
                println!(
                    "   ⚠️  Configured model {} differs; rebuild the index",
                    config.ollama.model
                );
            }

            match VectorStore::open(&index_path).await {
                Ok(store) => match store.count().await {
                    Ok(count) => println!("   Documents: {}", count),
                    Err(e) => println!("   ❌ Documents: {}", e),
                },
                Err(e) => println!("   ❌ Table: {}", e),
            }
        }
        Err(e) => {
            warn!("Index unavailable: {}", e);
            println!("   ❌ Not built ({})", e);
        }
    }

    println!();
    println!("🤖 Ollama:");
    match OllamaClient::new(&config.ollama) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!("   ✅ Connected ({})", client.base_url());
                println!("   📋 Model: {}", config.ollama.model);
            }
            Err(e) => println!("   ⚠️  Unhealthy: {:#}", e),
        },
        Err(e) => println!("   ❌ Failed to create client: {:#}", e),
    }

    Ok(())
}
