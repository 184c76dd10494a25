//! Chatbot QC - an LLM-powered quality-control pipeline for a chatbot.
//!
//! Question/answer pairs are extracted from a question bank of PDF
//! documents. Each question is paraphrased, answered from its own text,
//! sent (in every paraphrased form) to the chatbot under test, and the
//! simulated answer is scored by an LLM auditor. Results are written as
//! one HTML report per document plus a per-document score summary.
//!
//! # Quick Start
//!
//! ```no_run
//! use chatbot_qc::{config::Config, pipeline::EvaluationPipeline};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load configuration
//!     let config = Config::load(None)?;
//!
//!     // Fails fast when the LLM credential is missing
//!     let pipeline = EvaluationPipeline::from_config(&config)?;
//!
//!     let documents = vec![PathBuf::from("pdfs/questions_seo.pdf")];
//!     let summary = pipeline.run_batch(&documents).await;
//!
//!     println!("{}", summary.format_table());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **SourceDocument / DocumentExtractor**: PDF and text loading, Q/A parsing
//! - **LlmClient**: OpenAI-compatible client behind the `TextGenerator` trait
//! - **RemoteQaClient**: the chatbot endpoint behind the `RemoteQa` trait
//! - **EvaluationPipeline**: per-document, per-question orchestration
//! - **score**: score extraction from free-form auditor text
//! - **HtmlReportRenderer / BatchSummary**: per-document reports and summary

pub mod config;
pub mod document;
pub mod error;
pub mod llm;
pub mod persistence;
pub mod pipeline;
pub mod remote_qa;
pub mod report;
pub mod score;
pub mod summary;
pub mod variants;

// Re-export commonly used types
pub use config::Config;
pub use document::{DocumentExtractor, QaPair, QuestionExtractor, SourceDocument, SourceQuestion};
pub use error::{QcError, Result};
pub use llm::{GenerationRole, LlmClient, TextGenerator};
pub use persistence::{load_summary, save_summary};
pub use pipeline::{EvaluationPipeline, PipelineOptions, QuestionReport};
pub use remote_qa::{RemoteAnswer, RemoteQa, RemoteQaClient};
pub use report::{HtmlReportRenderer, ReportRenderer};
pub use score::{ScoreStrategy, extract_score};
pub use summary::{BatchSummary, DocumentOutcome};
