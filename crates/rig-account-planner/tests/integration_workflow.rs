//! Integration tests for the research workflow and run registry
//!
//! Search and LLM are scripted; every scenario runs through
//! `ResearchOrchestrator` exactly as the CLI does.

mod common;

use std::sync::Arc;

use tokio::sync::Notify;

use common::{
    context, MockSearch, ScriptedLlm, ACME_REPORT, CLEAR_VERDICT, CONFLICT_VERDICT,
};
use rig_account_planner::state::HUMAN_CLARIFICATION_QUERY;
use rig_account_planner::{
    AgentState, CompiledWorkflow, ExecutionOutcome, MemoryCheckpointer, NodeId, PlannerError,
    Resolution, ResearchOrchestrator, RunResult,
};

fn orchestrator(search: MockSearch, llm: ScriptedLlm) -> (ResearchOrchestrator, Arc<MockSearch>, Arc<ScriptedLlm>) {
    let search = Arc::new(search);
    let llm = Arc::new(llm);
    let orchestrator = ResearchOrchestrator::new(
        context(search.clone(), llm.clone()),
        Arc::new(MemoryCheckpointer::new()),
    );
    (orchestrator, search, llm)
}

async fn paused_run(orchestrator: &ResearchOrchestrator) -> String {
    match orchestrator.start("Acme").await.expect("start failed") {
        RunResult::Paused { run_id, .. } => run_id,
        other => panic!("expected paused run, got {other:?}"),
    }
}

// =============================================================================
// Termination and routing
// =============================================================================

#[tokio::test]
async fn test_every_run_terminates_within_four_steps() {
    for (verdict, company) in [
        (CLEAR_VERDICT, "Acme"),
        (CONFLICT_VERDICT, "Acme"),
        (CLEAR_VERDICT, ""),
        ("garbage", "Globex"),
    ] {
        let workflow = CompiledWorkflow::new(context(
            Arc::new(MockSearch::conflicting_revenue()),
            Arc::new(ScriptedLlm::new(verdict, ACME_REPORT)),
        ));

        let execution = workflow
            .invoke(AgentState::new(company))
            .await
            .expect("workflow failed");
        assert!(execution.steps <= 4, "{company:?}: {} steps", execution.steps);

        if let ExecutionOutcome::Interrupted { next } = execution.outcome {
            assert_eq!(next, NodeId::HumanReview);
            let mut state = execution.state;
            state.conflicting_info = false;
            let resumed = workflow
                .resume_from(next, state)
                .await
                .expect("resume failed");
            assert_eq!(resumed.outcome, ExecutionOutcome::Completed);
            assert!(execution.steps + resumed.steps <= 4);
        }
    }
}

#[tokio::test]
async fn test_clear_verdict_never_pauses() {
    let (orchestrator, search, llm) = orchestrator(
        MockSearch::conflicting_revenue(),
        ScriptedLlm::new(CLEAR_VERDICT, ACME_REPORT),
    );

    let result = orchestrator.start("Acme").await.unwrap();

    match result {
        RunResult::Completed { final_report, .. } => {
            assert!(final_report.starts_with("# Account Plan: Acme"));
        }
        other => panic!("expected completed run, got {other:?}"),
    }
    assert_eq!(search.query_count(), 4);
    assert_eq!(llm.review_calls(), 1);
    assert_eq!(llm.writer_calls(), 1);
}

#[tokio::test]
async fn test_conflict_pauses_with_question() {
    let (orchestrator, _, llm) = orchestrator(
        MockSearch::conflicting_revenue(),
        ScriptedLlm::new(r#"{"conflict_detected": true, "clarification_question": "Q"}"#, ACME_REPORT),
    );

    let result = orchestrator.start("Acme").await.unwrap();

    let RunResult::Paused {
        run_id,
        clarification_question,
        conflicting_data,
    } = result
    else {
        panic!("expected paused run");
    };
    assert_eq!(clarification_question, "Q");
    assert!(conflicting_data.starts_with("Finding 1:"));
    assert!(conflicting_data.chars().count() <= 500);
    assert_eq!(llm.writer_calls(), 0);

    let snapshot = orchestrator.snapshot(&run_id).await.unwrap().unwrap();
    assert!(snapshot.is_suspended());
    assert!(snapshot.state.conflicting_info);
    assert_eq!(snapshot.metadata.get("status").map(String::as_str), Some("paused"));
}

// =============================================================================
// Resolutions
// =============================================================================

#[tokio::test]
async fn test_resume_stop_never_writes() {
    let (orchestrator, _, llm) = orchestrator(
        MockSearch::conflicting_revenue(),
        ScriptedLlm::new(CONFLICT_VERDICT, ACME_REPORT),
    );
    let run_id = paused_run(&orchestrator).await;

    let result = orchestrator.resume(&run_id, Resolution::Stop).await.unwrap();

    assert_eq!(result, RunResult::Stopped { run_id: run_id.clone() });
    assert_eq!(llm.writer_calls(), 0);

    let snapshot = orchestrator.snapshot(&run_id).await.unwrap().unwrap();
    assert!(snapshot.is_finished());
    assert!(!snapshot.state.conflicting_info);
    assert_eq!(snapshot.state.human_resolution, "stop");
    assert!(snapshot.state.final_report.is_empty());
}

#[tokio::test]
async fn test_resume_proceed_reaches_writer() {
    let (orchestrator, _, llm) = orchestrator(
        MockSearch::conflicting_revenue(),
        ScriptedLlm::new(CONFLICT_VERDICT, ACME_REPORT),
    );
    let run_id = paused_run(&orchestrator).await;

    let result = orchestrator
        .resume(&run_id, "proceed".parse().unwrap())
        .await
        .unwrap();

    assert!(matches!(result, RunResult::Completed { .. }));
    assert_eq!(llm.writer_calls(), 1);
    // the reviewer is not consulted again
    assert_eq!(llm.review_calls(), 1);

    let snapshot = orchestrator.snapshot(&run_id).await.unwrap().unwrap();
    assert!(!snapshot.state.conflicting_info);
    assert_eq!(snapshot.state.human_resolution, "proceed");
    assert!(!snapshot.state.clarification_question.is_empty());
}

#[tokio::test]
async fn test_resume_clarification_appends_finding_before_writing() {
    let (orchestrator, _, llm) = orchestrator(
        MockSearch::conflicting_revenue(),
        ScriptedLlm::new(CONFLICT_VERDICT, ACME_REPORT),
    );
    let run_id = paused_run(&orchestrator).await;
    let text = "Use the audited figure: revenue was $2B in FY2024.";

    orchestrator
        .resume(&run_id, text.parse().unwrap())
        .await
        .unwrap();

    let snapshot = orchestrator.snapshot(&run_id).await.unwrap().unwrap();
    let added = snapshot.state.research_data.last().unwrap();
    assert_eq!(added.query, HUMAN_CLARIFICATION_QUERY);
    assert_eq!(added.content, text);
    assert_eq!(snapshot.state.human_resolution, "clarification");
    assert!(snapshot
        .state
        .messages
        .iter()
        .any(|m| m.ends_with(&format!("HUMAN CLARIFICATION: {text}"))));

    let prompts = llm.writer_prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(text));
}

// =============================================================================
// Degenerate inputs
// =============================================================================

#[tokio::test]
async fn test_zero_search_results() {
    let (orchestrator, _, llm) = orchestrator(
        MockSearch::empty(),
        ScriptedLlm::new(CONFLICT_VERDICT, ACME_REPORT),
    );

    let result = orchestrator.start("Acme").await.unwrap();

    assert_eq!(
        result.report(),
        Some("# Account Plan: Acme\n\nInsufficient data for analysis.")
    );
    assert_eq!(llm.review_calls(), 0);
    assert_eq!(llm.writer_calls(), 0);

    let snapshot = orchestrator.snapshot(result.run_id()).await.unwrap().unwrap();
    assert!(!snapshot.state.conflicting_info);
    assert!(snapshot.state.research_data.is_empty());
}

#[tokio::test]
async fn test_empty_company_name() {
    let (orchestrator, search, llm) = orchestrator(
        MockSearch::conflicting_revenue(),
        ScriptedLlm::new(CONFLICT_VERDICT, ACME_REPORT),
    );

    let result = orchestrator.start("").await.unwrap();

    assert!(matches!(result, RunResult::Completed { .. }));
    assert_eq!(
        result.report(),
        Some("# Account Plan: Unknown Company\n\nInsufficient data for analysis.")
    );
    assert_eq!(search.query_count(), 0);
    assert_eq!(llm.writer_calls(), 0);

    let snapshot = orchestrator.snapshot(result.run_id()).await.unwrap().unwrap();
    assert!(snapshot.state.research_data.is_empty());
    assert!(snapshot
        .state
        .messages
        .iter()
        .any(|m| m == "ERROR: No company name provided for research"));
}

#[tokio::test]
async fn test_missing_collaborators_still_complete() {
    let orchestrator = ResearchOrchestrator::new(
        rig_account_planner::StageContext::new(Default::default()),
        Arc::new(MemoryCheckpointer::new()),
    );

    let result = orchestrator.start("Acme").await.unwrap();

    assert_eq!(
        result.report(),
        Some("# Account Plan: Acme\n\nInsufficient data for analysis.")
    );
    let snapshot = orchestrator.snapshot(result.run_id()).await.unwrap().unwrap();
    assert!(snapshot
        .state
        .messages
        .iter()
        .any(|m| m == "ERROR: TAVILY_API_KEY not found in environment"));
}

// =============================================================================
// Acme end-to-end scenario
// =============================================================================

#[tokio::test]
async fn test_acme_conflict_then_proceed() {
    let (orchestrator, _, llm) = orchestrator(
        MockSearch::new(vec![common::hit(
            "Acme revenue",
            "Acme revenue was $2B according to one source and $3B according to another.",
        )]),
        ScriptedLlm::new(CONFLICT_VERDICT, ACME_REPORT),
    );

    let paused = orchestrator.start("Acme").await.unwrap();
    let RunResult::Paused {
        run_id,
        clarification_question,
        ..
    } = paused
    else {
        panic!("expected paused run");
    };
    assert!(!clarification_question.is_empty());

    let completed = orchestrator.resume(&run_id, Resolution::Proceed).await.unwrap();
    let RunResult::Completed { final_report, .. } = completed else {
        panic!("expected completed run");
    };
    assert!(final_report.starts_with("# Account Plan: Acme"));
    assert!(!final_report.contains("```"));
    assert_eq!(llm.writer_calls(), 1);
}

// =============================================================================
// Registry errors and lifecycle
// =============================================================================

#[tokio::test]
async fn test_resume_unknown_run() {
    let (orchestrator, _, _) = orchestrator(
        MockSearch::conflicting_revenue(),
        ScriptedLlm::new(CONFLICT_VERDICT, ACME_REPORT),
    );

    let result = orchestrator.resume("no-such-run", Resolution::Proceed).await;
    assert!(matches!(result, Err(PlannerError::RunNotFound(_))));
}

#[tokio::test]
async fn test_resume_finished_run_is_rejected() {
    let (orchestrator, _, llm) = orchestrator(
        MockSearch::conflicting_revenue(),
        ScriptedLlm::new(CONFLICT_VERDICT, ACME_REPORT),
    );
    let run_id = paused_run(&orchestrator).await;
    orchestrator.resume(&run_id, Resolution::Proceed).await.unwrap();

    let again = orchestrator.resume(&run_id, Resolution::Proceed).await;
    assert!(matches!(again, Err(PlannerError::NotPaused { .. })));
    assert_eq!(llm.writer_calls(), 1);
}

#[tokio::test]
async fn test_resume_rejects_blank_clarification() {
    let (orchestrator, _, _) = orchestrator(
        MockSearch::conflicting_revenue(),
        ScriptedLlm::new(CONFLICT_VERDICT, ACME_REPORT),
    );
    let run_id = paused_run(&orchestrator).await;

    let result = orchestrator
        .resume(&run_id, Resolution::Clarification("  ".to_string()))
        .await;
    assert!(matches!(result, Err(PlannerError::InvalidResolution(_))));

    // still paused
    assert!(orchestrator.snapshot(&run_id).await.unwrap().unwrap().is_suspended());
}

#[tokio::test]
async fn test_concurrent_resume_is_rejected() {
    let gate = Arc::new(Notify::new());
    let llm = ScriptedLlm::new(CONFLICT_VERDICT, ACME_REPORT).with_writer_gate(gate.clone());
    let entered = llm.writer_entered.clone();
    let (orchestrator, _, llm) = orchestrator(MockSearch::conflicting_revenue(), llm);
    let orchestrator = Arc::new(orchestrator);
    let run_id = paused_run(&orchestrator).await;

    let first = tokio::spawn({
        let orchestrator = orchestrator.clone();
        let run_id = run_id.clone();
        async move { orchestrator.resume(&run_id, Resolution::Proceed).await }
    });

    // first resume is now blocked inside the writer
    entered.notified().await;
    let second = orchestrator.resume(&run_id, Resolution::Stop).await;
    assert!(matches!(second, Err(PlannerError::RunBusy(_))));

    gate.notify_one();
    let first = first.await.unwrap().unwrap();
    assert!(matches!(first, RunResult::Completed { .. }));
    assert_eq!(llm.writer_calls(), 1);
}

#[tokio::test]
async fn test_independent_runs_execute_concurrently() {
    let (orchestrator, _, _) = orchestrator(
        MockSearch::conflicting_revenue(),
        ScriptedLlm::new(CLEAR_VERDICT, ACME_REPORT),
    );

    let (a, b) = tokio::join!(orchestrator.start("Acme"), orchestrator.start("Globex"));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.run_id(), b.run_id());
    let runs = orchestrator.runs().await.unwrap();
    assert_eq!(runs.len(), 2);

    let globex = orchestrator.snapshot(b.run_id()).await.unwrap().unwrap();
    assert_eq!(globex.state.company_name, "Globex");
}

#[tokio::test]
async fn test_start_with_id_and_discard() {
    let (orchestrator, _, _) = orchestrator(
        MockSearch::conflicting_revenue(),
        ScriptedLlm::new(CLEAR_VERDICT, ACME_REPORT),
    );

    orchestrator.start_with_id("acme-q3", "Acme").await.unwrap();
    let duplicate = orchestrator.start_with_id("acme-q3", "Acme").await;
    assert!(matches!(duplicate, Err(PlannerError::RunExists(_))));

    let invalid = orchestrator.start_with_id("../acme", "Acme").await;
    assert!(matches!(invalid, Err(PlannerError::InvalidRunId(_))));

    assert_eq!(orchestrator.runs().await.unwrap(), vec!["acme-q3"]);
    assert!(orchestrator.discard("acme-q3").await.unwrap());
    assert!(!orchestrator.discard("acme-q3").await.unwrap());
    assert!(orchestrator.snapshot("acme-q3").await.unwrap().is_none());
}
