//! The research reasoning loop.

use super::decision::{Action, Decision};
use super::intent::{classify_intent, generate_chat_response, Intent};
use super::planner::{create_plan, format_plan};
use super::state::{AgentPhase, AgentState, SourceStatus};
use crate::chunking::{truncate_chars, truncate_with_marker};
use crate::config::Prompts;
use crate::error::{Result, SleuthError};
use crate::llm::{ChatMessage, ChatModel, CompletionRequest};
use crate::rag::ReportSynthesizer;
use crate::tools::{describe_tools, ToolCall, ToolInvoker, ToolOutput};
use crate::vector_store::Chunk;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Characters of a tool result fed back to the model.
pub const MAX_OBSERVATION_CHARS: usize = 2000;

/// Marker appended to a cut observation.
pub const OBSERVATION_MARKER: &str = "...(truncated)";

/// Characters kept in each log entry.
pub const LOG_PREVIEW_CHARS: usize = 200;

/// Drives classification, tool use and synthesis for one query at a time.
pub struct ResearchAgent {
    llm: Arc<dyn ChatModel>,
    tools: Arc<dyn ToolInvoker>,
    synthesizer: ReportSynthesizer,
    prompts: Prompts,
    model: String,
    max_iterations: usize,
    tool_timeout: Duration,
    plan_first: bool,
    retrieve_k: usize,
}

impl ResearchAgent {
    /// Create an agent that reasons with `llm` and acts through `tools`.
    pub fn new(llm: Arc<dyn ChatModel>, tools: Arc<dyn ToolInvoker>, model: &str) -> Self {
        Self {
            synthesizer: ReportSynthesizer::new(llm.clone(), model),
            llm,
            tools,
            prompts: Prompts::default(),
            model: model.to_string(),
            max_iterations: 5,
            tool_timeout: Duration::from_secs(60),
            plan_first: false,
            retrieve_k: 5,
        }
    }

    /// Set custom prompts for every stage.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.synthesizer = self.synthesizer.with_prompts(prompts.clone());
        self.prompts = prompts;
        self
    }

    /// Set maximum iterations for the reasoning loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Ask for a step list before acting.
    pub fn with_planning(mut self, enabled: bool) -> Self {
        self.plan_first = enabled;
        self
    }

    /// Number of chunks retrieved for the report.
    pub fn with_retrieve_k(mut self, k: usize) -> Self {
        self.retrieve_k = k;
        self
    }

    /// Run a full research session.
    ///
    /// Research-flow failures never escape: they end up in the observation
    /// log and, when fatal to the run, in the report text.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn run(&self, query: &str) -> AgentState {
        let mut state = AgentState::new(query);
        info!(run_id = %state.run_id(), "Starting research run");

        enter(AgentPhase::Classifying);
        let intent = match classify_intent(self.llm.as_ref(), &self.prompts, &self.model, query).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!("Intent classification failed: {}", e);
                state.observe(format!("Intent classification failed: {}", e));
                Intent::Research
            }
        };

        if intent == Intent::Conversation {
            enter(AgentPhase::Conversing);
            state.observe("Classified as conversational query.");
            let report =
                match generate_chat_response(self.llm.as_ref(), &self.prompts, &self.model, query).await {
                    Ok(reply) => reply,
                    Err(e) => format!("Failed to generate chat response: {}", e),
                };
            state.finish(report);
            return state;
        }

        if self.plan_first {
            enter(AgentPhase::Planning);
            match create_plan(self.llm.as_ref(), &self.prompts, &self.model, query).await {
                Ok(steps) => state.plan = Some(steps),
                Err(e) => {
                    warn!("Planning failed: {}", e);
                    state.observe(format!("Planning failed: {}", e));
                }
            }
        }

        enter(AgentPhase::Acting);
        self.reason(&mut state).await;

        enter(AgentPhase::Synthesizing);
        let report = match self.synthesize(query).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Synthesis failed: {}", e);
                format!("Failed to synthesize report: {}", e)
            }
        };
        state.finish(report);

        enter(AgentPhase::Done);
        info!(
            iterations = state.iterations,
            tools = state.tools_used().len(),
            "Research run finished"
        );
        state
    }

    /// The bounded think, act, observe loop.
    async fn reason(&self, state: &mut AgentState) {
        let mut vars = HashMap::new();
        vars.insert("tools".to_string(), describe_tools());
        let system = self.prompts.render_with_custom(&self.prompts.agent.system, &vars);

        let mut opening = format!("Query: {}", state.query());
        if let Some(plan) = &state.plan {
            opening.push_str(&format!("\n\nPlan:\n{}", format_plan(plan)));
        }

        let mut messages = vec![ChatMessage::system(system), ChatMessage::user(opening)];

        for iteration in 1..=self.max_iterations {
            state.iterations = iteration;
            debug!("Agent iteration {}", iteration);

            let request = CompletionRequest::new(&self.model, messages.clone())
                .temperature(0.1)
                .json();

            let reply = match self.llm.complete(request).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("Decision call failed: {}", e);
                    state.observe(format!("Iteration {} failed at LLM reasoning: {}", iteration, e));
                    break;
                }
            };

            let decision = match Decision::parse(&reply) {
                Ok(decision) => decision,
                Err(e) => {
                    warn!("Unusable decision: {}", e);
                    state.observe(format!("Iteration {} aborted: {}", iteration, preview(&e.to_string())));
                    break;
                }
            };

            state.observe(format!("Thought: {}", preview(&decision.thought)));
            messages.push(ChatMessage::assistant(reply));

            let call = match decision.action {
                Action::Complete => {
                    state.observe("Research complete.");
                    break;
                }
                Action::Tool(call) => call,
            };

            state.record_tool(call.name());
            state.observe(format!(
                "Action: {}({})",
                call.name(),
                preview(&call.arguments().to_string())
            ));
            info!("Agent calling tool: {}", call.name());

            match self.invoke(&call).await {
                Ok(output) => {
                    if let Some(url) = call.fetched_url() {
                        state.record_source(url, SourceStatus::Indexed);
                    }
                    state.observe(format!(
                        "Observation: {}...",
                        truncate_chars(&output.content, LOG_PREVIEW_CHARS)
                    ));
                    messages.push(ChatMessage::user(format!(
                        "Observation: {}",
                        truncate_with_marker(&output.content, MAX_OBSERVATION_CHARS, OBSERVATION_MARKER)
                    )));
                }
                Err(e) => {
                    if let Some(url) = call.fetched_url() {
                        state.record_source(url, SourceStatus::Failed);
                    }
                    let message = format!("Error executing tool {}: {}", call.name(), e);
                    warn!("{}", message);
                    state.observe(format!("Observation: {}", preview(&message)));
                    messages.push(ChatMessage::user(truncate_with_marker(
                        &message,
                        MAX_OBSERVATION_CHARS,
                        OBSERVATION_MARKER,
                    )));
                }
            }
        }
    }

    /// Call a tool under the per-call timeout.
    async fn invoke(&self, call: &ToolCall) -> Result<ToolOutput> {
        match tokio::time::timeout(
            self.tool_timeout,
            self.tools.call_tool(call.name(), call.arguments()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SleuthError::Timeout(self.tool_timeout)),
        }
    }

    /// Retrieve the top chunks through the tool protocol and write the report.
    async fn synthesize(&self, query: &str) -> Result<String> {
        let call = ToolCall::QueryRag {
            query: query.to_string(),
            k: self.retrieve_k as i64,
        };
        let output = self.invoke(&call).await?;

        let chunks: Vec<Chunk> = if output.content.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&output.content)?
        };
        debug!("Synthesizing from {} chunks", chunks.len());

        self.synthesizer.synthesize(query, &chunks).await
    }
}

fn enter(phase: AgentPhase) {
    debug!(%phase, "Entering phase");
}

/// Log-sized prefix of model or tool text.
fn preview(text: &str) -> String {
    truncate_with_marker(text, LOG_PREVIEW_CHARS, "...")
}
