//! LLM prompts for the three generation roles.
//!
//! Templates use `{placeholder}` markers filled with [`str::replace`].

/// Collection of prompts used by the QC pipeline.
pub struct Prompts;

impl Prompts {
    /// System prompt for the paraphrasing role.
    pub fn system_paraphraser() -> &'static str {
        "You are a Paraphrasing Agent. You generate variations of questions while keeping their meaning intact, so the same question can be asked in several ways."
    }

    /// System prompt for the simulated-answer role.
    pub fn system_simulator() -> &'static str {
        "You are a QC Testing Agent. You provide simulated answers strictly based on the given question, ensuring relevance and clarity. Do not use outside knowledge."
    }

    /// System prompt for the auditor role.
    pub fn system_auditor() -> &'static str {
        "You are a QC Auditor Agent. You evaluate the relevance, accuracy, and clarity of answers to a question and give a score (0-100) with justification. Always return a numerical score and justification."
    }

    /// Prompt asking for `{count}` meaning-preserving variations of `{question}`.
    pub fn paraphrase() -> &'static str {
        r#"Generate {count} variations of the following question while keeping the meaning intact:

{question}

Return exactly {count} paraphrased variations as a numbered list, one per line, and nothing else."#
    }

    /// Prompt asking for an answer grounded only in `{question}`.
    pub fn simulate() -> &'static str {
        r#"Provide a simulated answer strictly based on the question: {question}

Use only what the question itself states or implies. Do not add outside knowledge."#
    }

    /// Prompt asking for a 0-100 score of `{answer}` against `{question}`.
    pub fn audit() -> &'static str {
        r#"Evaluate the response based on the question: {question}
Simulated Answer: {answer}
Return a numerical score (0-100) with justification."#
    }

    /// Fill the paraphrase template.
    pub fn render_paraphrase(question: &str, count: usize) -> String {
        Self::paraphrase()
            .replace("{count}", &count.to_string())
            .replace("{question}", question)
    }

    /// Fill the simulate template.
    pub fn render_simulate(question: &str) -> String {
        Self::simulate().replace("{question}", question)
    }

    /// Fill the audit template.
    pub fn render_audit(question: &str, answer: &str) -> String {
        // Answer first so a literal "{question}" inside it is left alone.
        Self::audit()
            .replace("{answer}", answer)
            .replacen("{question}", question, 1)
    }
}
