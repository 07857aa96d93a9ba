//! Shared mocks for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use rig_account_planner::prompts::{REVIEWER_SYSTEM_PROMPT, WRITER_SYSTEM_PROMPT};
use rig_account_planner::{
    LLMProvider, LlmError, PlannerConfig, SearchError, SearchHit, SearchProvider, SearchRequest,
    StageContext,
};

pub const CONFLICT_VERDICT: &str =
    r#"{"conflict_detected": true, "clarification_question": "Is Acme's annual revenue $2B or $3B?"}"#;
pub const CLEAR_VERDICT: &str = r#"{"conflict_detected": false, "clarification_question": ""}"#;
pub const ACME_REPORT: &str = "```markdown\n# Account Plan: Acme\n\n## Executive Summary\nAcme sells widgets.\n```";

/// Search provider returning canned hits for every query
pub struct MockSearch {
    hits_per_query: Vec<SearchHit>,
    pub queries: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn new(hits_per_query: Vec<SearchHit>) -> Self {
        Self {
            hits_per_query,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Two findings disagreeing on revenue
    pub fn conflicting_revenue() -> Self {
        Self::new(vec![
            hit("Acme annual report", "Acme reported annual revenue of $2B."),
            hit("Acme market profile", "Acme's revenue reached $3B last year."),
        ])
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError> {
        self.queries.lock().unwrap().push(request.query.clone());
        Ok(self.hits_per_query.clone())
    }

    fn name(&self) -> &str {
        "mock-search"
    }
}

pub fn hit(title: &str, content: &str) -> SearchHit {
    SearchHit {
        title: title.to_string(),
        url: format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
        content: content.to_string(),
        score: 0.9,
    }
}

/// LLM that answers the review and writer prompts with fixed replies
pub struct ScriptedLlm {
    review_reply: String,
    writer_reply: String,
    review_calls: AtomicUsize,
    writer_calls: AtomicUsize,
    pub writer_prompts: Mutex<Vec<String>>,
    writer_gate: Option<Arc<Notify>>,
    pub writer_entered: Arc<Notify>,
}

impl ScriptedLlm {
    pub fn new(review_reply: &str, writer_reply: &str) -> Self {
        Self {
            review_reply: review_reply.to_string(),
            writer_reply: writer_reply.to_string(),
            review_calls: AtomicUsize::new(0),
            writer_calls: AtomicUsize::new(0),
            writer_prompts: Mutex::new(Vec::new()),
            writer_gate: None,
            writer_entered: Arc::new(Notify::new()),
        }
    }

    /// Writer calls block until the gate is notified
    pub fn with_writer_gate(mut self, gate: Arc<Notify>) -> Self {
        self.writer_gate = Some(gate);
        self
    }

    pub fn review_calls(&self) -> usize {
        self.review_calls.load(Ordering::SeqCst)
    }

    pub fn writer_calls(&self) -> usize {
        self.writer_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMProvider for ScriptedLlm {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        if system == REVIEWER_SYSTEM_PROMPT {
            self.review_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.review_reply.clone())
        } else if system == WRITER_SYSTEM_PROMPT {
            self.writer_calls.fetch_add(1, Ordering::SeqCst);
            self.writer_prompts.lock().unwrap().push(user.to_string());
            if let Some(gate) = &self.writer_gate {
                self.writer_entered.notify_one();
                gate.notified().await;
            }
            Ok(self.writer_reply.clone())
        } else {
            Err(LlmError::Completion("unexpected system prompt".to_string()))
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-v1"
    }
}

pub fn context(search: Arc<MockSearch>, llm: Arc<ScriptedLlm>) -> StageContext {
    StageContext::new(PlannerConfig::default())
        .with_search(search)
        .with_llm(llm)
}
