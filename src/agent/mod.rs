//! Autonomous research agent.
//!
//! Classifies the query, optionally plans, then runs a bounded
//! reason-act-observe loop over the tool catalog before handing the
//! gathered knowledge to the report synthesizer.

mod decision;
mod intent;
mod planner;
mod runner;
mod state;

pub use decision::{Action, Decision, COMPLETE_ACTION};
pub use intent::{classify_intent, generate_chat_response, Intent};
pub use planner::{create_plan, format_plan, parse_plan};
pub use runner::{ResearchAgent, LOG_PREVIEW_CHARS, MAX_OBSERVATION_CHARS, OBSERVATION_MARKER};
pub use state::{AgentPhase, AgentState, Source, SourceStatus};
