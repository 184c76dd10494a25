//! Evaluation pipeline.
//!
//! For every document in a batch:
//! 1. Resolve and extract its question/answer pairs
//! 2. For each question, in extraction order:
//!    paraphrase -> simulate an answer -> ask the chatbot each paraphrase
//!    (optional) -> audit the simulated answer -> extract a score
//! 3. Render a report for the scored questions and record a document score
//!
//! Failures are contained at the smallest scope that still yields a useful
//! unit: a chatbot call failure is recorded on its variant, any other failure
//! while processing a question abandons the rest of that document, and no
//! failure ever stops the batch.

use crate::config::Config;
use crate::document::{DocumentExtractor, QuestionExtractor, SourceQuestion};
use crate::error::{QcError, Result};
use crate::llm::{GenerationRole, LlmClient, Prompts, TextGenerator};
use crate::remote_qa::{RemoteAnswer, RemoteQa, RemoteQaClient};
use crate::report::{HtmlReportRenderer, ReportRenderer};
use crate::score::{ScoreStrategy, clamp_score};
use crate::summary::{BatchSummary, DocumentOutcome};
use crate::variants::parse_variants;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A paraphrase of a source question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionVariant {
    /// 1-indexed position among the question's variants.
    pub variant_index: usize,
    pub text: String,
}

impl QuestionVariant {
    pub fn new(variant_index: usize, text: impl Into<String>) -> Self {
        Self {
            variant_index,
            text: text.into(),
        }
    }
}

/// Answer produced from the question text alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedAnswer {
    pub text: String,
}

/// The auditor's verdict on a simulated answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    /// Score on the 0-100 scale.
    pub score: u32,
    /// Number as read from the auditor text, before clamping.
    pub raw_score: u32,
    /// Full auditor output.
    pub justification: String,
    /// The text that was audited.
    pub source_text: String,
}

/// Everything produced for one scored question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionReport {
    pub question: SourceQuestion,
    pub variants: Vec<QuestionVariant>,
    pub simulated_answer: SimulatedAnswer,
    /// Empty when remote QA is disabled.
    pub remote_answers: Vec<RemoteAnswer>,
    pub audit: AuditResult,
}

/// Options for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Paraphrases requested per question.
    pub variant_count: usize,
    /// Send paraphrases of one question to the chatbot concurrently.
    pub parallel_remote: bool,
    pub score_strategy: ScoreStrategy,
    /// Bound on each text-generation call.
    pub llm_timeout: Duration,
    /// Bound on each chatbot call.
    pub remote_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            variant_count: 5,
            parallel_remote: false,
            score_strategy: ScoreStrategy::BareNumber,
            llm_timeout: Duration::from_secs(120),
            remote_timeout: Duration::from_secs(60),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            variant_count: config.pipeline.variant_count,
            parallel_remote: config.pipeline.parallel_remote,
            score_strategy: config.pipeline.score_strategy,
            llm_timeout: config.llm.timeout(),
            remote_timeout: config.remote_qa.timeout(),
        }
    }
}

/// Drives documents through extraction, generation, chatbot calls and audit.
pub struct EvaluationPipeline {
    generator: Box<dyn TextGenerator>,
    remote: Option<Box<dyn RemoteQa>>,
    extractor: Box<dyn QuestionExtractor>,
    renderer: Box<dyn ReportRenderer>,
    options: PipelineOptions,
}

impl EvaluationPipeline {
    /// Assemble a pipeline from its collaborators; remote QA starts disabled.
    pub fn new(
        generator: Box<dyn TextGenerator>,
        extractor: Box<dyn QuestionExtractor>,
        renderer: Box<dyn ReportRenderer>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            generator,
            remote: None,
            extractor,
            renderer,
            options,
        }
    }

    /// Send every paraphrase to this chatbot.
    pub fn with_remote_qa(mut self, remote: Box<dyn RemoteQa>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Build the production pipeline, failing fast on missing credentials.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let renderer = HtmlReportRenderer::new(
            config.pipeline.output_dir.clone(),
            config.pipeline.pass_threshold,
        )
        .with_model(&config.llm.model);

        let pipeline = Self::new(
            Box::new(LlmClient::new(config.llm.clone())),
            Box::new(DocumentExtractor),
            Box::new(renderer),
            PipelineOptions::from_config(config),
        );

        if config.remote_qa.enabled {
            Ok(pipeline.with_remote_qa(Box::new(RemoteQaClient::new(config.remote_qa.clone()))))
        } else {
            Ok(pipeline)
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn remote_qa_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Process every document; the summary has one entry per distinct input.
    pub async fn run_batch(&self, documents: &[PathBuf]) -> BatchSummary {
        let mut summary = BatchSummary::new();

        for (idx, path) in documents.iter().enumerate() {
            let document_id = path.display().to_string();
            if summary.get(&document_id).is_some() {
                tracing::debug!(document = %document_id, "Already processed, skipping duplicate");
                continue;
            }
            tracing::info!(
                document = %path.display(),
                "[{}/{}] Processing document",
                idx + 1,
                documents.len()
            );
            let outcome = self.run_document(path).await;
            summary.record(document_id, outcome);
        }

        summary
    }

    /// Process one document to its outcome, rendering its report on success.
    pub async fn run_document(&self, path: &Path) -> DocumentOutcome {
        let document_id = path.display().to_string();

        if !self.extractor.exists(path) {
            tracing::warn!(document = %document_id, "File not found");
            return DocumentOutcome::NotFound;
        }

        let pairs = match self.extractor.extract(path) {
            Ok(pairs) => pairs,
            Err(QcError::DocumentNotFound(_)) => {
                tracing::warn!(document = %document_id, "File not found");
                return DocumentOutcome::NotFound;
            }
            Err(e) => {
                tracing::error!(document = %document_id, error = %e, "Extraction failed");
                Vec::new()
            }
        };

        if pairs.is_empty() {
            tracing::warn!(document = %document_id, "No questions found");
            return DocumentOutcome::NoQuestionsFound;
        }

        let questions = SourceQuestion::from_pairs(&document_id, pairs);
        tracing::info!(document = %document_id, questions = questions.len(), "Extracted questions");

        let mut reports = Vec::with_capacity(questions.len());
        for question in &questions {
            match self.evaluate_question(question).await {
                Ok(Some(report)) => reports.push(report),
                Ok(None) => {
                    tracing::warn!(
                        document = %document_id,
                        question = question.ordinal_index,
                        "Skipping question as no variations were generated"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        document = %document_id,
                        question = question.ordinal_index,
                        error = %e,
                        "Error processing document"
                    );
                    return DocumentOutcome::ProcessingError {
                        detail: e.to_string(),
                    };
                }
            }
        }

        if reports.is_empty() {
            return DocumentOutcome::NoScoredQuestions;
        }

        if let Err(e) = self.renderer.render(path, &reports) {
            tracing::error!(document = %document_id, error = %e, "Failed to write report");
        }

        DocumentOutcome::Scored {
            score: document_score(&reports),
        }
    }

    /// Run the per-question procedure.
    ///
    /// Returns `Ok(None)` when paraphrasing yields no variants; nothing
    /// further is generated for that question.
    pub async fn evaluate_question(&self, question: &SourceQuestion) -> Result<Option<QuestionReport>> {
        let count = self.options.variant_count;

        let paraphrased = self
            .generate(&Prompts::render_paraphrase(&question.text, count), GenerationRole::Paraphrase)
            .await?;
        let variants: Vec<QuestionVariant> = parse_variants(&paraphrased, count)
            .into_iter()
            .enumerate()
            .map(|(i, text)| QuestionVariant::new(i + 1, text))
            .collect();

        if variants.is_empty() {
            return Ok(None);
        }
        tracing::debug!(question = question.ordinal_index, variants = variants.len(), "Generated variations");

        let simulated = self
            .generate(&Prompts::render_simulate(&question.text), GenerationRole::Simulate)
            .await?;
        let simulated_answer = SimulatedAnswer {
            text: simulated.trim().to_string(),
        };

        let remote_answers = match &self.remote {
            Some(remote) => self.ask_all(remote.as_ref(), &variants).await,
            None => Vec::new(),
        };

        let audit_text = self
            .generate(
                &Prompts::render_audit(&question.text, &simulated_answer.text),
                GenerationRole::Audit,
            )
            .await?;

        let raw_score = self.options.score_strategy.extract(&audit_text);
        let score = clamp_score(raw_score);
        if raw_score != score {
            tracing::warn!(question = question.ordinal_index, raw_score, "Audit score out of range, clamped");
        }
        tracing::info!(
            document = %question.source_document,
            question = question.ordinal_index,
            score,
            "Question audited"
        );

        Ok(Some(QuestionReport {
            question: question.clone(),
            variants,
            audit: AuditResult {
                score,
                raw_score,
                justification: audit_text.trim().to_string(),
                source_text: simulated_answer.text.clone(),
            },
            simulated_answer,
            remote_answers,
        }))
    }

    /// One bounded text-generation call.
    async fn generate(&self, prompt: &str, role: GenerationRole) -> Result<String> {
        let after = self.options.llm_timeout;
        match tokio::time::timeout(after, self.generator.generate(prompt, role)).await {
            Ok(result) => result,
            Err(_) => Err(QcError::Timeout {
                operation: role.as_str(),
                after,
            }),
        }
    }

    /// Ask the chatbot every variant; results come back in variant order.
    async fn ask_all(&self, remote: &dyn RemoteQa, variants: &[QuestionVariant]) -> Vec<RemoteAnswer> {
        if self.options.parallel_remote {
            join_all(variants.iter().map(|v| self.ask_one(remote, v))).await
        } else {
            let mut answers = Vec::with_capacity(variants.len());
            for variant in variants {
                answers.push(self.ask_one(remote, variant).await);
            }
            answers
        }
    }

    async fn ask_one(&self, remote: &dyn RemoteQa, variant: &QuestionVariant) -> RemoteAnswer {
        let after = self.options.remote_timeout;
        let outcome = match tokio::time::timeout(after, remote.ask(&variant.text)).await {
            Ok(result) => result,
            Err(_) => Err(QcError::Timeout {
                operation: "chatbot request",
                after,
            }),
        };

        if let Err(e) = &outcome {
            tracing::warn!(variant = variant.variant_index, error = %e, "Chatbot request failed");
        }

        RemoteAnswer::from_outcome(variant.variant_index, &variant.text, outcome)
    }
}

/// Rounded mean of the question scores.
pub fn document_score(reports: &[QuestionReport]) -> u32 {
    if reports.is_empty() {
        return 0;
    }
    let total: u32 = reports.iter().map(|r| r.audit.score).sum();
    (total as f64 / reports.len() as f64).round() as u32
}
