//! Research stage: four fixed web searches about the company.

use futures::future::join_all;
use tracing::{info, warn};

use super::StageContext;
use crate::prompts::research_queries;
use crate::search::{SearchError, SearchHit, SearchProvider, SearchRequest};
use crate::state::{AgentState, AgentUpdate, ResearchFinding};

pub const NO_COMPANY_ERROR: &str = "ERROR: No company name provided for research";
pub const NO_SEARCH_KEY_ERROR: &str = "ERROR: TAVILY_API_KEY not found in environment";

/// Replace `research_data` with the findings of every query that succeeded.
///
/// A failing query is logged and skipped. Findings are grouped by query in
/// query order whether the searches ran sequentially or concurrently.
pub async fn research(ctx: &StageContext, state: &AgentState) -> AgentUpdate {
    let company = state.company_name.trim();

    if company.is_empty() {
        warn!("Research skipped: no company name");
        return skipped(NO_COMPANY_ERROR);
    }

    let Some(search) = ctx.search() else {
        warn!("Research skipped: no search provider configured");
        return skipped(NO_SEARCH_KEY_ERROR);
    };

    info!(company = %company, provider = search.name(), "Starting research");

    let mut update = AgentUpdate::new();
    update.log(format!("Starting research on: {company}"));

    let queries = research_queries(company);
    let outcomes = if ctx.config().parallel_search {
        join_all(queries.iter().map(|q| run_query(ctx, search.as_ref(), q))).await
    } else {
        let mut outcomes = Vec::with_capacity(queries.len());
        for query in &queries {
            outcomes.push(run_query(ctx, search.as_ref(), query).await);
        }
        outcomes
    };

    let mut findings = Vec::new();
    for (query, outcome) in queries.iter().zip(outcomes) {
        update.log(format!("  → Searching: {query}"));
        match outcome {
            Ok(hits) => {
                update.log(format!("  ✓ Found {} results", hits.len()));
                findings.extend(hits.into_iter().map(|hit| finding(query, hit)));
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Search failed");
                update.log(format!("  ✗ Error searching '{query}': {e}"));
            }
        }
    }

    info!(count = findings.len(), "Research complete");
    update.log(format!("\nResearch complete: {} total findings", findings.len()));
    update.with_research_data(findings)
}

fn skipped(reason: &str) -> AgentUpdate {
    let mut update = AgentUpdate::new().with_research_data(Vec::new());
    update.log(reason);
    update
}

async fn run_query(
    ctx: &StageContext,
    search: &dyn SearchProvider,
    query: &str,
) -> Result<Vec<SearchHit>, SearchError> {
    let config = ctx.config();
    let request = SearchRequest::new(query)
        .with_depth(config.search_depth)
        .with_max_results(config.max_results_per_query);

    match config.search_timeout {
        Some(limit) => match tokio::time::timeout(limit, search.search(&request)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout),
        },
        None => search.search(&request).await,
    }
}

fn finding(query: &str, hit: SearchHit) -> ResearchFinding {
    ResearchFinding {
        query: query.to_string(),
        title: hit.title,
        url: hit.url,
        content: hit.content,
        score: hit.score,
    }
}
