//! Chatbot QC CLI
//!
//! Runs the question bank through the QC pipeline and prints a per-document
//! score summary.

use anyhow::{Context, Result};
use chatbot_qc::{
    config::Config,
    document::{SourceDocument, is_pdf},
    llm::LlmClient,
    persistence::{load_summary, save_summary},
    pipeline::EvaluationPipeline,
    remote_qa::{RemoteQa, RemoteQaClient},
    score::ScoreStrategy,
    summary::BatchSummary,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Question used by the connectivity test.
const TEST_QUESTION: &str = "What services does CHL offer?";

/// Chatbot QC - audit a chatbot against a PDF question bank
#[derive(Parser)]
#[command(name = "chatbot-qc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the per-user config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the QC pipeline over question-bank documents
    Run {
        /// PDF or text documents; directories are searched recursively
        #[arg(required = true)]
        documents: Vec<PathBuf>,

        /// Do not send variants to the chatbot endpoint
        #[arg(long)]
        no_remote: bool,

        /// Number of paraphrases per question
        #[arg(long)]
        variants: Option<usize>,

        /// Send the paraphrases of a question to the chatbot concurrently
        #[arg(long)]
        parallel: bool,

        /// How to read the score out of the auditor's reply
        #[arg(long, value_enum)]
        score_strategy: Option<StrategyArg>,

        /// Directory for HTML reports (defaults to next to each document)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Save the batch summary (.json or .bin)
        #[arg(long)]
        summary_out: Option<PathBuf>,
    },

    /// Print the question/answer pairs extracted from a document
    Extract {
        /// PDF or text document
        document: PathBuf,
    },

    /// Print a saved batch summary
    Summary {
        /// Path to a summary saved with --summary-out
        path: PathBuf,
    },

    /// Test LLM and chatbot endpoint connectivity
    Test,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// First standalone 1-3 digit number
    BareNumber,
    /// Number after a "Score:" label
    Labeled,
}

impl From<StrategyArg> for ScoreStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::BareNumber => ScoreStrategy::BareNumber,
            StrategyArg::Labeled => ScoreStrategy::Labeled,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            documents,
            no_remote,
            variants,
            parallel,
            score_strategy,
            output_dir,
            summary_out,
        } => {
            let mut config =
                Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
            if no_remote {
                config.remote_qa.enabled = false;
            }
            if let Some(n) = variants {
                config.pipeline.variant_count = n;
            }
            if parallel {
                config.pipeline.parallel_remote = true;
            }
            if let Some(strategy) = score_strategy {
                config.pipeline.score_strategy = strategy.into();
            }
            if output_dir.is_some() {
                config.pipeline.output_dir = output_dir;
            }
            cmd_run(config, documents, summary_out).await
        }
        Commands::Extract { document } => cmd_extract(document),
        Commands::Summary { path } => cmd_summary(path),
        Commands::Test => cmd_test(cli.config.as_deref()).await,
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Expand directories into the PDF and text files they contain.
///
/// Paths that do not exist are passed through so they are reported as not found.
/// A document named more than once is kept at its first position only.
fn collect_documents(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut documents = Vec::new();
    for input in inputs {
        let expanded = if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| is_pdf(path) || is_text(path))
                .collect();
            if found.is_empty() {
                tracing::warn!(directory = %input.display(), "No PDF or text documents in directory");
            }
            found.sort();
            found
        } else {
            vec![input.clone()]
        };

        for path in expanded {
            if seen.insert(path.clone()) {
                documents.push(path);
            } else {
                tracing::debug!(document = %path.display(), "Skipping duplicate document");
            }
        }
    }
    documents
}

fn is_text(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("txt")
}

async fn cmd_run(config: Config, inputs: Vec<PathBuf>, summary_out: Option<PathBuf>) -> Result<()> {
    let pipeline = EvaluationPipeline::from_config(&config).context("Invalid configuration")?;

    let documents = collect_documents(&inputs);
    println!("Processing {} document(s)", documents.len());
    println!("Using model: {}", config.llm.model);
    if pipeline.remote_qa_enabled() {
        println!("Chatbot endpoint: {}", config.remote_qa.url);
    } else {
        println!("Chatbot endpoint: disabled");
    }

    let start = Instant::now();
    let summary = pipeline.run_batch(&documents).await;
    let elapsed = start.elapsed();

    summary.log();
    print_summary(&summary);
    println!("Total time: {:.1?}", elapsed);

    if let Some(path) = summary_out {
        save_summary(&summary, &path).context("Failed to save summary")?;
        println!("Summary saved to: {}", path.display());
    }

    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("{}", summary.format_table());
    if let Some(mean) = summary.mean_score() {
        println!("Mean score: {:.1}", mean);
    }
    if let Some(chart) = summary.format_chart() {
        println!();
        println!("{}", chart);
    }
}

fn cmd_extract(document_path: PathBuf) -> Result<()> {
    let document = SourceDocument::load(&document_path).context("Failed to load document")?;
    let pairs = document.qa_pairs();

    println!(
        "Document: {} ({} pages with text)",
        document.name,
        document.page_count()
    );
    println!("{}", "─".repeat(60));

    if pairs.is_empty() {
        println!("No questions found.");
        return Ok(());
    }

    for (i, pair) in pairs.iter().enumerate() {
        println!("Q{}: {}", i + 1, pair.question);
        println!("A{}: {}", i + 1, pair.answer);
        println!();
    }
    println!("{} question(s) found", pairs.len());

    Ok(())
}

fn cmd_summary(path: PathBuf) -> Result<()> {
    let summary = load_summary(&path).context("Failed to load summary")?;
    print_summary(&summary);
    Ok(())
}

async fn cmd_test(config_path: Option<&Path>) -> Result<()> {
    println!("Testing connectivity...\n");

    let config = Config::load(config_path).context("Failed to load configuration")?;

    println!("Configuration:");
    println!("  LLM API Base:  {}", config.llm.api_base);
    println!("  LLM Model:     {}", config.llm.model);
    println!(
        "  LLM API Key:   {}...",
        config.llm.api_key.chars().take(8).collect::<String>()
    );
    println!("  Chatbot URL:   {}", config.remote_qa.url);
    println!("  Referer:       {}", config.remote_qa.referer);
    println!();

    if config.llm.api_key.is_empty() {
        println!("LLM: skipped (no API key)");
    } else {
        let client = LlmClient::new(config.llm.clone());
        println!("Sending LLM test request...");
        match client.test_connection().await {
            Ok(()) => println!("LLM: connection successful!"),
            Err(e) => println!("LLM: connection failed: {}", e),
        }
    }

    if config.remote_qa.url.is_empty() {
        println!("Chatbot: skipped (CHL_API_URL not set)");
        return Ok(());
    }

    let remote = RemoteQaClient::new(config.remote_qa.clone());
    println!("\nSending \"{}\" to {}...", TEST_QUESTION, remote.url());
    match remote.ask(TEST_QUESTION).await {
        Ok(reply) => {
            println!("Chatbot: connection successful!");
            if let Some(id) = &reply.conversation_id {
                println!("  Conversation: {}", id);
            }
            let preview: String = reply.answer.chars().take(500).collect();
            println!("  Answer: {}", preview);
        }
        Err(e) => println!("Chatbot: request failed: {}", e),
    }

    Ok(())
}
