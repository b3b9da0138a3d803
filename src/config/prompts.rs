//! Prompt templates for Sleuth.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory:
//! `intent.toml`, `planner.toml`, `agent.toml`, `chat.toml` and `report.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub intent: SystemPrompt,
    pub planner: SystemPrompt,
    pub agent: SystemPrompt,
    pub chat: SystemPrompt,
    pub report: ReportPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// A prompt consisting of a single system message.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SystemPrompt {
    pub system: String,
}

impl SystemPrompt {
    fn new(system: &str) -> Self {
        Self {
            system: system.to_string(),
        }
    }
}

/// Prompts for report synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportPrompts {
    pub system: String,
    pub user: String,
}

const INTENT_SYSTEM: &str = r#"You are an intent classifier. Determine if the user's query requires internet research or if it is a simple conversational greeting, thanks or closing.
Respond with ONLY the word RESEARCH or CONVERSATION.

Examples:
'Hi' -> CONVERSATION
'Thank you' -> CONVERSATION
'Who is the CEO of Google?' -> RESEARCH
'Explain quantum physics' -> RESEARCH"#;

const PLANNER_SYSTEM: &str = r#"You are a research planner. Break the task into concrete, ordered steps, one per line.
Do not execute tools and do not answer the question."#;

const AGENT_SYSTEM: &str = r#"You are an autonomous research agent. Your goal is to research the user's query thoroughly.
You have access to tools. Use them to gather information, index it into the memory store, and eventually a report will be synthesized from what you indexed.
Users may have already indexed local documents (like PDFs) into the memory store; use `query_rag` to check for this existing knowledge first.

Work in steps: Reasoning -> Action -> Observation.

Available tools:
{{tools}}

Respond with a JSON object with exactly two fields:
1. "thought": your reasoning about what to do next.
2. "action": the tool call to make, e.g. {"name": "web_search", "arguments": {"query": "..."}}, or {"name": "complete", "arguments": {}} when done.

You MUST use tools to gather information for research queries. Do NOT rely on your training data to answer.
Only finish when you have gathered enough information and indexed it."#;

const CHAT_SYSTEM: &str =
    "You are a helpful AI assistant. Respond conversationally and briefly to the user.";

const REPORT_SYSTEM: &str = r###"You are an expert researcher writing a structured report from the provided sources.

Rules:
- Cite every factual claim inline as [Source N], using the numbers given in the context.
- Never state facts that are absent from the provided sources.
- If part of the query cannot be answered from the sources, name that part explicitly in a "Limitations" section.
- End with a "## References" section that lists every numbered source exactly as given in the reference list."###;

const REPORT_USER: &str = r#"Query: {{query}}

Context:
{{context}}

Reference list:
{{references}}"#;

impl Default for ReportPrompts {
    fn default() -> Self {
        Self {
            system: REPORT_SYSTEM.to_string(),
            user: REPORT_USER.to_string(),
        }
    }
}

impl Default for Prompts {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Prompts {
    /// Built-in prompts with no overrides.
    pub fn builtin() -> Self {
        Self {
            intent: SystemPrompt::new(INTENT_SYSTEM),
            planner: SystemPrompt::new(PLANNER_SYSTEM),
            agent: SystemPrompt::new(AGENT_SYSTEM),
            chat: SystemPrompt::new(CHAT_SYSTEM),
            report: ReportPrompts::default(),
            variables: HashMap::new(),
        }
    }

    /// Load prompts, applying overrides from `custom_dir` and custom variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Self::builtin();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            if let Some(p) = read_override(&custom_path, "intent.toml")? {
                prompts.intent = p;
            }
            if let Some(p) = read_override(&custom_path, "planner.toml")? {
                prompts.planner = p;
            }
            if let Some(p) = read_override(&custom_path, "agent.toml")? {
                prompts.agent = p;
            }
            if let Some(p) = read_override(&custom_path, "chat.toml")? {
                prompts.chat = p;
            }
            if let Some(p) = read_override(&custom_path, "report.toml")? {
                prompts.report = p;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Single pass over the template: substituted values are never scanned
    /// again, and unknown placeholders are left as they are.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            match after.find("}}") {
                Some(close) => {
                    let key = &after[..close];
                    match vars.get(key) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[close + 2..];
                }
                None => {
                    result.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }

    /// Render with custom config variables; provided variables take precedence.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

fn read_override<T: serde::de::DeserializeOwned>(
    dir: &std::path::Path,
    file: &str,
) -> crate::error::Result<Option<T>> {
    let path = dir.join(file);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)?;
    Ok(Some(toml::from_str(&content)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_prompts() {
        let prompts = Prompts::builtin();
        assert!(prompts.intent.system.contains("RESEARCH"));
        assert!(prompts.agent.system.contains("{{tools}}"));
        assert!(prompts.report.system.contains("[Source N]"));
    }

    #[test]
    fn test_render_template() {
        let template = "Query: {{query}} ({{who}})";
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "rust".to_string());
        vars.insert("who".to_string(), "me".to_string());

        assert_eq!(Prompts::render(template, &vars), "Query: rust (me)");
    }

    #[test]
    fn test_render_does_not_expand_placeholders_inside_values() {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "page says {{references}} and {{query}}".to_string());
        vars.insert("references".to_string(), "1. [Source 1] a".repeat(50));
        vars.insert("query".to_string(), "rust".to_string());

        let out = Prompts::render("{{query}}|{{context}}|{{missing}}|{{unclosed", &vars);
        assert_eq!(out, "rust|page says {{references}} and {{query}}|{{missing}}|{{unclosed");
    }

    #[test]
    fn test_report_system_prompt_is_complete() {
        assert!(REPORT_SYSTEM.ends_with("exactly as given in the reference list."));
        assert!(REPORT_SYSTEM.contains("\"## References\""));
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut prompts = Prompts::builtin();
        prompts.variables.insert("who".to_string(), "config".to_string());
        prompts.variables.insert("org".to_string(), "acme".to_string());

        let mut vars = HashMap::new();
        vars.insert("who".to_string(), "caller".to_string());

        let out = prompts.render_with_custom("{{who}}@{{org}}", &vars);
        assert_eq!(out, "caller@acme");
    }

    #[test]
    fn test_override_file_replaces_prompt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chat.toml"), "system = \"Be terse.\"\n").unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.chat.system, "Be terse.");
        assert!(prompts.intent.system.contains("CONVERSATION"));
    }
}
