//! Per-run session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Phase of a research run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentPhase {
    Classifying,
    Conversing,
    Planning,
    Acting,
    Synthesizing,
    Done,
}

impl std::fmt::Display for AgentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AgentPhase::Classifying => "classifying",
            AgentPhase::Conversing => "conversing",
            AgentPhase::Planning => "planning",
            AgentPhase::Acting => "acting",
            AgentPhase::Synthesizing => "synthesizing",
            AgentPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Outcome of a fetch tool for one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Indexed,
    Failed,
}

/// A URL the agent tried to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub status: SourceStatus,
}

/// Everything a single run produced.
///
/// `query` and `run_id` are fixed at creation; the logs only grow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    run_id: Uuid,
    query: String,
    pub plan: Option<Vec<String>>,
    observations: Vec<String>,
    sources: Vec<Source>,
    tools_used: Vec<String>,
    pub report: String,
    /// Number of decision calls made to the model.
    pub iterations: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl AgentState {
    pub fn new(query: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            query: query.to_string(),
            plan: None,
            observations: Vec::new(),
            sources: Vec::new(),
            tools_used: Vec::new(),
            report: String::new(),
            iterations: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn observations(&self) -> &[String] {
        &self.observations
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn tools_used(&self) -> &[String] {
        &self.tools_used
    }

    pub fn observe(&mut self, entry: impl Into<String>) {
        self.observations.push(entry.into());
    }

    pub fn record_tool(&mut self, name: &str) {
        self.tools_used.push(name.to_string());
    }

    pub fn record_source(&mut self, url: &str, status: SourceStatus) {
        self.sources.push(Source {
            url: url.to_string(),
            status,
        });
    }

    /// Set the report and stamp the finish time.
    pub fn finish(&mut self, report: String) {
        self.report = report;
        self.finished_at = Some(Utc::now());
    }

    /// Sources that were indexed successfully, without duplicates.
    pub fn indexed_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = Vec::new();
        for source in &self.sources {
            if source.status == SourceStatus::Indexed && !urls.contains(&source.url.as_str()) {
                urls.push(&source.url);
            }
        }
        urls
    }
}
