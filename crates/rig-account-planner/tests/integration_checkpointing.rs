//! Integration tests for checkpoint persistence
//!
//! A paused run must survive the orchestrator that started it: these tests
//! pause with one instance and resume with another sharing only the store.

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::tempdir;

use common::{context, MockSearch, ScriptedLlm, ACME_REPORT, CONFLICT_VERDICT};
use rig_account_planner::{
    create_checkpointer, AgentState, Checkpoint, Checkpointer, CheckpointerConfig,
    FileCheckpointer, MemoryCheckpointer, NodeId, ResearchFinding, Resolution,
    ResearchOrchestrator, RunResult,
};

fn orchestrator_with(store: Arc<dyn Checkpointer>, llm: Arc<ScriptedLlm>) -> ResearchOrchestrator {
    ResearchOrchestrator::new(
        context(Arc::new(MockSearch::conflicting_revenue()), llm),
        store,
    )
}

fn sample_state() -> AgentState {
    let mut state = AgentState::new("Société Générale");
    state.messages = vec![
        "Starting research on: Société Générale".to_string(),
        "  ✓ Found 3 results".to_string(),
    ];
    state.research_data = vec![
        ResearchFinding {
            query: "Société Générale recent news and developments".to_string(),
            title: "Q3 results".to_string(),
            url: "https://example.com/q3".to_string(),
            content: "Net income €1.1bn \"beat\" estimates".to_string(),
            score: 0.123456789,
        },
        ResearchFinding::human_clarification("Use group-level figures"),
    ];
    state.conflicting_info = true;
    state.clarification_question = "Which CEO is current?".to_string();
    state.conflicting_data = "Finding 1:\nTitle: Q3 results".to_string();
    state
}

// =============================================================================
// Snapshot fidelity
// =============================================================================

#[tokio::test]
async fn test_snapshot_round_trip_all_stores() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let stores: Vec<Arc<dyn Checkpointer>> = vec![
        Arc::new(MemoryCheckpointer::new()),
        Arc::new(FileCheckpointer::new(temp_dir.path().join("plain"), false)),
        Arc::new(FileCheckpointer::new(temp_dir.path().join("zstd"), true)),
    ];

    for store in stores {
        let checkpoint = Checkpoint::new("run-1", sample_state(), NodeId::HumanReview)
            .with_metadata("company", "Société Générale");
        store.save(&checkpoint).await.expect("Failed to save");

        let loaded = store.load("run-1").await.expect("Failed to load").unwrap();
        assert_eq!(loaded, checkpoint);
        assert_eq!(loaded.state, sample_state());
    }
}

// =============================================================================
// Resume across orchestrator instances
// =============================================================================

async fn pause_then_resume_with_fresh_instance(config: CheckpointerConfig) {
    let store = create_checkpointer(config.clone()).expect("Failed to create store");
    let first_llm = Arc::new(ScriptedLlm::new(CONFLICT_VERDICT, ACME_REPORT));
    let first = orchestrator_with(store, first_llm.clone());

    let paused = first.start("Acme").await.expect("start failed");
    let run_id = paused.run_id().to_string();
    assert!(matches!(paused, RunResult::Paused { .. }));
    drop(first);

    // new store handle and orchestrator over the same directory
    let store = create_checkpointer(config).expect("Failed to reopen store");
    let second_llm = Arc::new(ScriptedLlm::new(CONFLICT_VERDICT, ACME_REPORT));
    let second = orchestrator_with(store, second_llm.clone());

    assert_eq!(second.runs().await.unwrap(), vec![run_id.clone()]);

    let result = second
        .resume(&run_id, Resolution::Clarification("Revenue is $2B".to_string()))
        .await
        .expect("resume failed");

    assert!(matches!(result, RunResult::Completed { .. }));
    assert_eq!(first_llm.writer_calls(), 0);
    assert_eq!(second_llm.review_calls(), 0);
    assert_eq!(second_llm.writer_calls(), 1);

    let snapshot = second.snapshot(&run_id).await.unwrap().unwrap();
    assert!(snapshot.is_finished());
    assert!(snapshot.updated_at >= snapshot.created_at);
    assert_eq!(snapshot.metadata.get("resolution").map(String::as_str), Some("clarification"));
    assert_eq!(snapshot.metadata.get("company").map(String::as_str), Some("Acme"));
}

#[tokio::test]
async fn test_file_store_resume_across_instances() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    pause_then_resume_with_fresh_instance(CheckpointerConfig::File {
        path: temp_dir.path().to_path_buf(),
        compression: false,
    })
    .await;
}

#[tokio::test]
async fn test_compressed_file_store_resume_across_instances() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    pause_then_resume_with_fresh_instance(CheckpointerConfig::File {
        path: temp_dir.path().join("nested").join("runs"),
        compression: true,
    })
    .await;
}

#[tokio::test]
async fn test_paused_checkpoint_on_disk_is_json() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let store = Arc::new(FileCheckpointer::new(temp_dir.path(), false));
    let orchestrator = orchestrator_with(
        store,
        Arc::new(ScriptedLlm::new(CONFLICT_VERDICT, ACME_REPORT)),
    );

    let paused = orchestrator.start("Acme").await.unwrap();

    let path: PathBuf = temp_dir.path().join(format!("{}.json", paused.run_id()));
    let raw = std::fs::read_to_string(path).expect("checkpoint file missing");
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(value["next_node"], "human_review");
    assert_eq!(value["state"]["company_name"], "Acme");
    assert_eq!(value["state"]["conflicting_info"], true);
    assert_eq!(value["metadata"]["status"], "paused");
}
