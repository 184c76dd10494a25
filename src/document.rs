//! Document representation and question extraction.
//!
//! Documents are a collection of pages of extracted text. PDF documents
//! are read page by page with `lopdf`; plain text files are treated as a
//! single page. Question/answer pairs are then parsed out of the joined
//! text, where each pair is written as `Question: ...` followed by a line
//! starting with `Answer: ...`.

use crate::error::{QcError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const QUESTION_MARKER: &str = "Question:";
const ANSWER_MARKER: &str = "\nAnswer:";

/// A single page in a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// 1-indexed page number.
    pub number: usize,
    /// Text content of the page.
    pub content: String,
}

impl Page {
    /// Create a new page.
    pub fn new(number: usize, content: String) -> Self {
        Self { number, content }
    }
}

/// A document consisting of one or more pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Document name (file stem).
    pub name: String,
    /// Original file path (if loaded from file).
    pub path: Option<PathBuf>,
    /// Pages in the document.
    pub pages: Vec<Page>,
}

impl SourceDocument {
    /// Load a PDF, keeping only pages that yield text.
    ///
    /// A page whose text cannot be extracted is logged and skipped; only a
    /// document that cannot be opened at all is an error.
    pub fn from_pdf(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(QcError::DocumentNotFound(path.to_path_buf()));
        }

        let pdf = lopdf::Document::load(path)
            .map_err(|e| QcError::extraction(path, e.to_string()))?;

        let mut pages = Vec::new();
        for page_number in pdf.get_pages().keys() {
            match pdf.extract_text(&[*page_number]) {
                Ok(text) if !text.trim().is_empty() => {
                    pages.push(Page::new(*page_number as usize, text.trim().to_string()));
                }
                Ok(_) => {
                    tracing::debug!(document = %path.display(), page = page_number, "Page has no text");
                }
                Err(e) => {
                    tracing::warn!(
                        document = %path.display(),
                        page = page_number,
                        error = %e,
                        "Skipping unreadable page"
                    );
                }
            }
        }

        Ok(Self {
            name: file_stem(path),
            path: Some(path.to_path_buf()),
            pages,
        })
    }

    /// Load a text file as a single-page document.
    pub fn from_text_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(QcError::DocumentNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| QcError::io(path, e))?;

        Ok(Self {
            name: file_stem(path),
            path: Some(path.to_path_buf()),
            pages: vec![Page::new(1, content)],
        })
    }

    /// Load by extension: `.pdf` through lopdf, anything else as text.
    pub fn load(path: &Path) -> Result<Self> {
        if is_pdf(path) {
            Self::from_pdf(path)
        } else {
            Self::from_text_file(path)
        }
    }

    /// Create a document from raw text content.
    pub fn from_text(name: impl Into<String>, content: String) -> Self {
        Self {
            name: name.into(),
            path: None,
            pages: vec![Page::new(1, content)],
        }
    }

    /// Get total number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page texts joined by newlines, skipping empty pages.
    pub fn raw_content(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.content.as_str())
            .filter(|c| !c.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse the question/answer pairs out of this document.
    pub fn qa_pairs(&self) -> Vec<QaPair> {
        extract_qa_pairs(&self.raw_content())
    }
}

/// A question with its reference answer, as written in the question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl QaPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A question extracted from a specific document, in extraction order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceQuestion {
    /// Question text.
    pub text: String,
    /// Reference answer from the question bank.
    pub reference_answer: String,
    /// Identifier of the document it came from.
    pub source_document: String,
    /// 1-indexed position within the document.
    pub ordinal_index: usize,
}

impl SourceQuestion {
    /// Number the pairs of one document in extraction order.
    pub fn from_pairs(document: &str, pairs: Vec<QaPair>) -> Vec<Self> {
        pairs
            .into_iter()
            .enumerate()
            .map(|(i, pair)| Self {
                text: pair.question,
                reference_answer: pair.answer,
                source_document: document.to_string(),
                ordinal_index: i + 1,
            })
            .collect()
    }
}

/// Source of question/answer pairs for a document path.
pub trait QuestionExtractor: Send + Sync {
    /// Whether the document resolves at all.
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn extract(&self, path: &Path) -> Result<Vec<QaPair>>;
}

/// Extractor reading PDFs and text files from disk.
#[derive(Debug, Clone, Default)]
pub struct DocumentExtractor;

impl QuestionExtractor for DocumentExtractor {
    fn extract(&self, path: &Path) -> Result<Vec<QaPair>> {
        let document = SourceDocument::load(path)?;
        tracing::debug!(
            document = %document.name,
            pages = document.page_count(),
            "Loaded document"
        );
        Ok(document.qa_pairs())
    }
}

/// Parse `Question: ... \nAnswer: ...` pairs out of text.
///
/// The question runs from its marker to the first following `\nAnswer:`,
/// the answer from there to the next `Question:` or end of text. A question
/// with no answer marker is dropped.
pub fn extract_qa_pairs(text: &str) -> Vec<QaPair> {
    let starts: Vec<usize> = text
        .match_indices(QUESTION_MARKER)
        .map(|(i, _)| i + QUESTION_MARKER.len())
        .collect();

    let mut pairs = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts
            .get(i + 1)
            .map(|next| next - QUESTION_MARKER.len())
            .unwrap_or(text.len());
        let segment = &text[start..end];

        let Some(split) = segment.find(ANSWER_MARKER) else {
            continue;
        };

        let question = segment[..split].trim();
        let answer = segment[split + ANSWER_MARKER.len()..].trim();
        if question.is_empty() {
            continue;
        }

        pairs.push(QaPair::new(question, answer));
    }

    pairs
}

/// Whether a path has a `.pdf` extension (case-insensitive).
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};
    use tempfile::TempDir;

    const BANK: &str = "Accessibility FAQ\n\
Question: Do you follow WCAG 2.1?\n\
Answer: Yes, all sites target WCAG 2.1 AA.\n\
Question: Can you audit an existing site?\n\
Answer: We offer audits\nwith a written report.\n";

    #[test]
    fn test_extract_qa_pairs() {
        let pairs = extract_qa_pairs(BANK);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].question, "Do you follow WCAG 2.1?");
        assert_eq!(pairs[0].answer, "Yes, all sites target WCAG 2.1 AA.");
        assert_eq!(pairs[1].question, "Can you audit an existing site?");
        assert_eq!(pairs[1].answer, "We offer audits\nwith a written report.");
    }

    #[test]
    fn test_multiline_question() {
        let pairs = extract_qa_pairs("Question: How long\ndoes a redesign take?\nAnswer: 8 weeks");
        assert_eq!(pairs, vec![QaPair::new("How long\ndoes a redesign take?", "8 weeks")]);
    }

    #[test]
    fn test_question_without_answer_is_dropped() {
        let pairs = extract_qa_pairs("Question: orphan?\nQuestion: real?\nAnswer: yes");
        assert_eq!(pairs, vec![QaPair::new("real?", "yes")]);
        assert!(extract_qa_pairs("no markers here").is_empty());
    }

    #[test]
    fn test_source_questions_keep_order() {
        let questions = SourceQuestion::from_pairs("seo", extract_qa_pairs(BANK));
        assert_eq!(questions[0].ordinal_index, 1);
        assert_eq!(questions[1].ordinal_index, 2);
        assert!(questions.iter().all(|q| q.source_document == "seo"));
    }

    #[test]
    fn test_raw_content_skips_blank_pages() {
        let doc = SourceDocument {
            name: "doc".to_string(),
            path: None,
            pages: vec![
                Page::new(1, "Question: a?".to_string()),
                Page::new(2, "   ".to_string()),
                Page::new(3, "Answer: b".to_string()),
            ],
        };
        assert_eq!(doc.raw_content(), "Question: a?\nAnswer: b");
        assert_eq!(doc.qa_pairs(), vec![QaPair::new("a?", "b")]);
    }

    #[test]
    fn test_text_extractor() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bank.txt");
        std::fs::write(&path, BANK).unwrap();

        let pairs = DocumentExtractor.extract(&path).unwrap();
        assert_eq!(pairs.len(), 2);

        let doc = SourceDocument::load(&path).unwrap();
        assert_eq!(doc.name, "bank");
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_missing_document() {
        let result = DocumentExtractor.extract(Path::new("/nonexistent/bank.pdf"));
        assert!(matches!(result, Err(QcError::DocumentNotFound(_))));
    }

    /// Write a PDF with one page per entry; an empty entry yields a page with no text.
    fn write_pdf(path: &Path, page_texts: &[&str]) {
        let mut pdf = lopdf::Document::with_version("1.5");
        let pages_id = pdf.new_object_id();
        let font_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = pdf.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in page_texts {
            let operations = if text.is_empty() {
                Vec::new()
            } else {
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ]
            };
            let content = Content { operations };
            let content_id = pdf.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        pdf.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        pdf.trailer.set("Root", catalog_id);
        pdf.save(path).unwrap();
    }

    #[test]
    fn test_pdf_skips_pages_without_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bank.pdf");
        write_pdf(&path, &["Question: a?", "", "Answer: b"]);

        let doc = SourceDocument::from_pdf(&path).unwrap();
        assert_eq!(doc.name, "bank");
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[0].number, 1);
        assert_eq!(doc.pages[1].number, 3);
        assert_eq!(doc.raw_content(), "Question: a?\nAnswer: b");

        let pairs = DocumentExtractor.extract(&path).unwrap();
        assert_eq!(pairs, vec![QaPair::new("a?", "b")]);
    }

    #[test]
    fn test_corrupt_pdf_is_extraction_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let result = SourceDocument::from_pdf(&path);
        assert!(matches!(result, Err(QcError::Extraction { .. })));
    }

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("a/b.pdf")));
        assert!(is_pdf(Path::new("B.PDF")));
        assert!(!is_pdf(Path::new("bank.txt")));
        assert!(!is_pdf(Path::new("pdf")));
    }
}
