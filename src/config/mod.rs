//! Configuration module for Sleuth.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, ReportPrompts, SystemPrompt};
pub use settings::{
    AgentSettings, EmbeddingSettings, GeneralSettings, LlmSettings, MemorySettings,
    PromptSettings, SearchSettings, Settings,
};
