//! Review stage: ask the model whether the findings contradict each other.

use tracing::{info, warn};

use super::StageContext;
use crate::config::ParseFailurePolicy;
use crate::error::LlmError;
use crate::parsing::{parse_review_verdict, strip_json_fences, truncate_chars};
use crate::prompts::{format_findings, review_user_message, UrlLabel, REVIEWER_SYSTEM_PROMPT};
use crate::state::{AgentState, AgentUpdate};

/// Question raised when the verdict is unparsable and the policy fails closed
pub const UNPARSABLE_VERDICT_QUESTION: &str =
    "The automated reviewer returned output that could not be parsed. Please review the research data manually before continuing.";

pub async fn review(ctx: &StageContext, state: &AgentState) -> AgentUpdate {
    let config = ctx.config();
    let mut update = AgentUpdate::new();
    update.log("\nREVIEWER: Analyzing research data for conflicts...");

    if state.research_data.is_empty() {
        update.log("  No research data to review");
        return update.with_conflict(false, "", "");
    }

    let evidence = format_findings(&state.research_data, config.review_findings_limit, UrlLabel::Url);
    let excerpt = || truncate_chars(&evidence, config.conflict_excerpt_chars).to_string();

    let Some(llm) = ctx.llm() else {
        let error = LlmError::NotConfigured("no language model available for review".to_string());
        warn!(error = %error, "Review skipped");
        update.log(format!("  ✗ Error during review: {error}"));
        return update.with_conflict(false, "", "");
    };

    update.log(format!("  → Sending data to {} for analysis...", llm.name()));
    let user = review_user_message(&state.company_name, &evidence);
    let raw = match llm.complete(REVIEWER_SYSTEM_PROMPT, &user).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Review model call failed");
            update.log(format!("  ✗ Error during review: {e}"));
            return update.with_conflict(false, "", "");
        }
    };
    update.log("  ✓ Review response received");

    match parse_review_verdict(&raw) {
        Ok(verdict) if verdict.conflict_detected => {
            info!(question = %verdict.clarification_question, "Conflict detected");
            update
                .log("\nCONFLICT DETECTED!")
                .log(format!("  Question: {}", verdict.clarification_question));
            update.with_conflict(true, verdict.clarification_question, excerpt())
        }
        Ok(_) => {
            info!("No conflicts detected");
            update.log("\nNo conflicts detected - data appears consistent");
            update.with_conflict(false, "", "")
        }
        Err(e) => {
            let snippet = truncate_chars(strip_json_fences(&raw), config.raw_snippet_chars);
            warn!(error = %e, policy = ?config.parse_failure_policy, "Unparsable review verdict");
            update
                .log(format!("  ✗ Error parsing review response: {e}"))
                .log(format!("  Raw response: {snippet}..."));

            match config.parse_failure_policy {
                ParseFailurePolicy::FailOpen => update.with_conflict(false, "", ""),
                ParseFailurePolicy::FailClosed => {
                    update.log("  Unparsable verdict treated as a conflict");
                    update.with_conflict(true, UNPARSABLE_VERDICT_QUESTION, excerpt())
                }
            }
        }
    }
}
