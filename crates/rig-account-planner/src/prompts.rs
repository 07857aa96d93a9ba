//! Prompt text and prompt builders for the research, review and write stages.

use crate::state::ResearchFinding;

/// Company placeholder used in reports when no name was given
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

pub const REVIEWER_SYSTEM_PROMPT: &str = r#"You are a skeptical data auditor. Your only task is to compare all provided facts about the company and strictly look for numerical or factual discrepancies (e.g., conflicting revenue, different CEO names, contradictory strategic goals).

Analyze the research data carefully and determine if there are any contradictions or conflicts.

Respond ONLY with a valid JSON object in this exact format:
{
    "conflict_detected": true or false,
    "clarification_question": "Your question here if conflict detected, otherwise empty string"
}

Do not include any other text, explanations, or markdown formatting. Only output the JSON object."#;

pub const WRITER_SYSTEM_PROMPT: &str = r#"
You are a highly analytical and experienced Sales Strategist and Account Planning Specialist.
Your task is to take the validated company research data and synthesize it into a formal, structured Account Plan document.

**CRITICAL RULE:** The output MUST be formatted strictly as **Markdown**. Use clear headings (#, ##) and bullet points.

**Account Plan Structure (Mandatory Headings):**

# Account Plan: [Company Name]
## Executive Summary
(1-2 concise paragraphs summarizing the company's current financial health and strategic direction.)

## Key Financial & Operational Insights
* **Annual Revenue (Latest):** [Insert validated number]
* **CEO/Key Decision Maker:** [Insert validated name]
* **Recent News (Last 6 Months):** [Synthesize the 2 most relevant non-conflicting news items.]
* **Strategic Direction/Pain Point:** [What is their primary business goal or major challenge right now?]

## SWOT Analysis (For Sales Strategy)
| Category | Summary |
|:---|:---|
| **Strengths** | (Internal advantages) |
| **Weaknesses** | (Internal limitations/Pain points your product could solve) |
| **Opportunities** | (Market trends they can exploit) |
| **Threats** | (Competitors, market risks) |

## Conversation Starters for Sales Team
(Provide 3 specific, non-generic questions based directly on the research to start a sales dialogue.)
1. ...
2. ...
3. ...

**DATA SOURCE:** Only use the validated, non-conflicting research data provided in the state. Do not invent any facts.
"#;

/// Report shown when a run was stopped at human review
pub const STOPPED_REPORT: &str =
    "# Research Paused\n\nResearch was stopped due to conflicting information requiring manual review.";

/// Label placed before each finding's URL in an evidence block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlLabel {
    /// `URL:` (review prompt)
    Url,
    /// `Source:` (writer prompt)
    Source,
}

impl UrlLabel {
    fn as_str(&self) -> &'static str {
        match self {
            UrlLabel::Url => "URL",
            UrlLabel::Source => "Source",
        }
    }
}

/// The four research queries, in execution order.
pub fn research_queries(company: &str) -> [String; 4] {
    [
        format!("{company} company overview and business model"),
        format!("{company} recent news and developments"),
        format!("{company} products and services"),
        format!("{company} market position and competitors"),
    ]
}

/// Numbered evidence block over the first `limit` findings, separated by blank lines.
pub fn format_findings(findings: &[ResearchFinding], limit: usize, label: UrlLabel) -> String {
    findings
        .iter()
        .take(limit)
        .enumerate()
        .map(|(idx, f)| {
            format!(
                "Finding {}:\nTitle: {}\nContent: {}\n{}: {}",
                idx + 1,
                f.title,
                f.content,
                label.as_str(),
                f.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn review_user_message(company: &str, evidence: &str) -> String {
    format!("Analyze this research data about {company}:\n\n{evidence}")
}

pub fn writer_user_message(company: &str, evidence: &str) -> String {
    format!("Generate an Account Plan for {company} based on this research data:\n\n{evidence}")
}

/// Name used in report headings; blank names render as [`UNKNOWN_COMPANY`].
pub fn report_company(company: &str) -> &str {
    if company.trim().is_empty() {
        UNKNOWN_COMPANY
    } else {
        company
    }
}

pub fn insufficient_data_report(company: &str) -> String {
    format!(
        "# Account Plan: {}\n\nInsufficient data for analysis.",
        report_company(company)
    )
}

pub fn error_report(company: &str, error: &dyn std::fmt::Display) -> String {
    format!(
        "# Account Plan: {}\n\nError generating report: {}",
        report_company(company),
        error
    )
}
