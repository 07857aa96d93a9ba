//! Writing stage: synthesize the Markdown account plan.

use tracing::{info, warn};

use super::StageContext;
use crate::error::LlmError;
use crate::parsing::clean_markdown_report;
use crate::prompts::{
    error_report, format_findings, insufficient_data_report, report_company, writer_user_message,
    UrlLabel, WRITER_SYSTEM_PROMPT,
};
use crate::state::{AgentState, AgentUpdate};

pub async fn write_report(ctx: &StageContext, state: &AgentState) -> AgentUpdate {
    let mut update = AgentUpdate::new();
    update.log("\nWRITER: Generating account plan...");

    let company = report_company(&state.company_name);

    if state.research_data.is_empty() {
        update.log("  No research data available for report generation");
        return update.with_final_report(insufficient_data_report(company));
    }

    let evidence = format_findings(
        &state.research_data,
        ctx.config().writer_findings_limit,
        UrlLabel::Source,
    );

    let result = match ctx.llm() {
        Some(llm) => {
            update.log(format!("  → Sending data to {} for synthesis...", llm.name()));
            llm.complete(WRITER_SYSTEM_PROMPT, &writer_user_message(company, &evidence))
                .await
        }
        None => Err(LlmError::NotConfigured(
            "no language model available for report generation".to_string(),
        )),
    };

    match result {
        Ok(text) => {
            let report = clean_markdown_report(&text);
            let chars = report.chars().count();
            info!(chars, "Account plan generated");
            update.log(format!("  ✓ Account plan generated successfully ({chars} characters)"));
            update.with_final_report(report)
        }
        Err(e) => {
            warn!(error = %e, "Report generation failed");
            update.log(format!("  ✗ Error generating report: {e}"));
            update.with_final_report(error_report(company, &e))
        }
    }
}
