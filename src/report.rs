//! Static HTML reports, one per document.

use crate::error::{QcError, Result};
use crate::pipeline::QuestionReport;
use std::fs;
use std::path::{Path, PathBuf};

/// Receives the scored questions of one document.
///
/// Never called for a document without at least one scored question.
pub trait ReportRenderer: Send + Sync {
    /// Render the report and return where it was written.
    fn render(&self, document: &Path, questions: &[QuestionReport]) -> Result<PathBuf>;
}

/// Writes `<stem>_report.html` next to the document or into `output_dir`.
#[derive(Debug, Clone)]
pub struct HtmlReportRenderer {
    output_dir: Option<PathBuf>,
    pass_threshold: u32,
    model: Option<String>,
}

impl HtmlReportRenderer {
    pub fn new(output_dir: Option<PathBuf>, pass_threshold: u32) -> Self {
        Self {
            output_dir,
            pass_threshold,
            model: None,
        }
    }

    /// Mention the generation model in the report header.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Output path for a document's report.
    pub fn report_path(&self, document: &Path) -> PathBuf {
        let stem = document
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let dir = match &self.output_dir {
            Some(dir) => dir.clone(),
            None => document.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        dir.join(format!("{}_report.html", stem))
    }
}

impl ReportRenderer for HtmlReportRenderer {
    fn render(&self, document: &Path, questions: &[QuestionReport]) -> Result<PathBuf> {
        let title = document
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let html = render_html(title, questions, self.pass_threshold, self.model.as_deref());

        let path = self.report_path(document);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| QcError::io(parent, e))?;
            }
        }
        fs::write(&path, html).map_err(|e| QcError::io(&path, e))?;

        tracing::info!(report = %path.display(), "HTML report generated");
        Ok(path)
    }
}

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; margin: 40px; background-color: #f4f4f9; color: #333; }
h1 { color: #004085; text-align: center; }
h2 { color: #007bff; border-bottom: 2px solid #007bff; padding-bottom: 5px; }
h3 { color: #0056b3; margin-top: 20px; }
.meta { text-align: center; color: #666; }
.container { background: #fff; padding: 20px; border-radius: 8px; box-shadow: 0 0 10px rgba(0, 0, 0, 0.1); margin-bottom: 20px; }
.reference, .variations { background: #e9ecef; padding: 15px; border-radius: 5px; margin-bottom: 10px; }
.simulated-answer { background: #d6e9f9; padding: 15px; border-radius: 5px; margin-bottom: 10px; }
.remote-answers { background: #fff3cd; padding: 15px; border-radius: 5px; margin-bottom: 10px; }
.remote-error { color: #721c24; }
.audit { padding: 15px; border-radius: 5px; margin-bottom: 10px; }
.audit-high { background: #d4edda; }
.audit-low { background: #f8d7da; }
.variation-list { list-style-type: none; padding: 0; }
.variation-list li { margin: 5px 0; }
pre { white-space: pre-wrap; font-family: inherit; margin: 0; }
"#;

/// Render one document's questions as a standalone HTML page.
pub fn render_html(
    title: &str,
    questions: &[QuestionReport],
    pass_threshold: u32,
    model: Option<&str>,
) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>Analysis Report for {}</title>\n<style>{}</style>\n</head>\n<body>\n",
        html_escape(title),
        STYLE
    ));
    html.push_str(&format!("<h1>Analysis Report for {}</h1>\n", html_escape(title)));
    if let Some(model) = model {
        html.push_str(&format!(
            "<p class=\"meta\">Generated with {}</p>\n",
            html_escape(model)
        ));
    }

    for report in questions {
        html.push_str(&render_question(report, pass_threshold));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_question(report: &QuestionReport, pass_threshold: u32) -> String {
    let mut out = String::from("<div class=\"container\">\n");

    out.push_str(&format!(
        "<h2>Original Question {}:</h2>\n<p><strong>{}</strong></p>\n",
        report.question.ordinal_index,
        html_escape(&report.question.text)
    ));

    if !report.question.reference_answer.is_empty() {
        out.push_str(&format!(
            "<div class=\"reference\"><h3>Reference Answer:</h3><pre>{}</pre></div>\n",
            html_escape(&report.question.reference_answer)
        ));
    }

    out.push_str("<div class=\"variations\"><h3>Question Variations:</h3><ul class=\"variation-list\">\n");
    for variant in &report.variants {
        out.push_str(&format!(
            "<li><strong>Variation {}:</strong> {}</li>\n",
            variant.variant_index,
            html_escape(&variant.text)
        ));
    }
    out.push_str("</ul></div>\n");

    out.push_str(&format!(
        "<div class=\"simulated-answer\"><h3>Simulated Answer:</h3><pre>{}</pre></div>\n",
        html_escape(&report.simulated_answer.text)
    ));

    if !report.remote_answers.is_empty() {
        out.push_str("<div class=\"remote-answers\"><h3>Chatbot Answers:</h3>\n");
        for answer in &report.remote_answers {
            out.push_str(&format!(
                "<h4>Variation {}: {}</h4>\n",
                answer.variant_index,
                html_escape(&answer.question)
            ));
            if answer.errored {
                out.push_str(&format!(
                    "<p class=\"remote-error\">Error: {}</p>\n",
                    html_escape(answer.error_detail.as_deref().unwrap_or("unknown error"))
                ));
            } else {
                out.push_str(&format!("<pre>{}</pre>\n", html_escape(&answer.answer_text)));
                if let Some(id) = &answer.conversation_id {
                    out.push_str(&format!(
                        "<p><small>Conversation: {}</small></p>\n",
                        html_escape(id)
                    ));
                }
            }
        }
        out.push_str("</div>\n");
    }

    let audit_class = if report.audit.score >= pass_threshold {
        "audit-high"
    } else {
        "audit-low"
    };
    out.push_str(&format!(
        "<div class=\"audit {}\"><h3>QC Auditor</h3>\n<p><strong>Final Score: {}</strong></p>\n<pre>{}</pre></div>\n",
        audit_class,
        report.audit.score,
        html_escape(&report.audit.justification)
    ));

    out.push_str("</div>\n");
    out
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SourceQuestion;
    use crate::pipeline::{AuditResult, QuestionVariant, SimulatedAnswer};
    use crate::remote_qa::RemoteAnswer;
    use tempfile::TempDir;

    fn report(score: u32, remote: Vec<RemoteAnswer>) -> QuestionReport {
        QuestionReport {
            question: SourceQuestion {
                text: "Do you offer <SEO> audits?".to_string(),
                reference_answer: "Yes.".to_string(),
                source_document: "seo.pdf".to_string(),
                ordinal_index: 1,
            },
            variants: vec![
                QuestionVariant::new(1, "Can you audit my SEO?"),
                QuestionVariant::new(2, "Is an SEO audit available?"),
            ],
            simulated_answer: SimulatedAnswer {
                text: "An SEO audit is offered.".to_string(),
            },
            remote_answers: remote,
            audit: AuditResult {
                score,
                raw_score: score,
                justification: format!("Score: {}. Grounded.", score),
                source_text: "An SEO audit is offered.".to_string(),
            },
        }
    }

    #[test]
    fn test_threshold_class() {
        let high = render_html("seo.pdf", &[report(95, vec![])], 95, None);
        assert!(high.contains("audit audit-high"));
        assert!(!high.contains("audit audit-low"));

        let low = render_html("seo.pdf", &[report(94, vec![])], 95, None);
        assert!(low.contains("audit audit-low"));
    }

    #[test]
    fn test_no_remote_section_without_answers() {
        let html = render_html("seo.pdf", &[report(80, vec![])], 95, Some("gpt-4"));
        assert!(!html.contains("Chatbot Answers"));
        assert!(html.contains("Variation 2:"));
        assert!(html.contains("Generated with gpt-4"));
    }

    #[test]
    fn test_remote_answers_rendered_with_errors() {
        let remote = vec![
            RemoteAnswer {
                variant_index: 1,
                question: "Can you audit my SEO?".to_string(),
                answer_text: "Yes we can.".to_string(),
                conversation_id: Some("abc".to_string()),
                errored: false,
                error_detail: None,
            },
            RemoteAnswer {
                variant_index: 2,
                question: "Is an SEO audit available?".to_string(),
                answer_text: String::new(),
                conversation_id: None,
                errored: true,
                error_detail: Some("HTTP request failed: timeout".to_string()),
            },
        ];
        let html = render_html("seo.pdf", &[report(80, remote)], 95, None);
        assert!(html.contains("Chatbot Answers"));
        assert!(html.contains("Yes we can."));
        assert!(html.contains("Error: HTTP request failed: timeout"));
        assert!(html.find("Yes we can.").unwrap() < html.find("Error: HTTP").unwrap());
    }

    #[test]
    fn test_text_is_escaped() {
        let html = render_html("seo.pdf", &[report(80, vec![])], 95, None);
        assert!(html.contains("Do you offer &lt;SEO&gt; audits?"));
        assert!(!html.contains("<SEO>"));
    }

    #[test]
    fn test_render_writes_file() {
        let dir = TempDir::new().unwrap();
        let renderer = HtmlReportRenderer::new(Some(dir.path().join("reports")), 95);
        let path = renderer
            .render(Path::new("pdfs/seo.pdf"), &[report(99, vec![])])
            .unwrap();

        assert_eq!(path, dir.path().join("reports/seo_report.html"));
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Analysis Report for seo.pdf"));
    }

    #[test]
    fn test_report_path_next_to_document() {
        let renderer = HtmlReportRenderer::new(None, 95);
        assert_eq!(
            renderer.report_path(Path::new("pdfs/seo.pdf")),
            PathBuf::from("pdfs/seo_report.html")
        );
    }
}
