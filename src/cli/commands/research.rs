//! Research command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the research command.
pub async fn run_research(
    query: &str,
    json: bool,
    max_iterations: Option<usize>,
    plan: bool,
    mut settings: Settings,
) -> Result<()> {
    preflight::check(&settings, Operation::Research)?;

    if let Some(max) = max_iterations {
        settings.agent.max_iterations = max;
    }
    if plan {
        settings.agent.plan_first = true;
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Researching...");
    let state = orchestrator.research(query).await;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        if let Some(steps) = &state.plan {
            Output::header("Plan");
            for step in steps {
                Output::list_item(step);
            }
        }
        Output::research_summary(&state);
    }

    Ok(())
}
