//! `agentry plan` -- generate and display a plan without executing it.

use anyhow::{Context, Result};
use comfy_table::{Cell, ContentArrangement, Table, presets};
use console::style;

use agentry_core::agent::Planner;

use crate::state::AppState;

pub async fn handle(state: &AppState, task: &str, json: bool) -> Result<()> {
    let (provider, model) = state.provider()?;
    let planner = Planner::new(provider, model)
        .with_temperature(state.config.llm.planner_temperature)
        .with_max_tokens(state.config.llm.max_completion_tokens);

    let plan = planner
        .create_plan(task, &state.registry)
        .await
        .context("plan creation failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!(
        "{} {} ({} steps)",
        style("plan").bold(),
        plan.task_description,
        plan.steps.len()
    );

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["id", "capability", "depends on", "optional", "description"]);

    for step in &plan.steps {
        table.add_row(vec![
            Cell::new(&step.id),
            Cell::new(&step.capability),
            Cell::new(step.depends_on.join(", ")),
            Cell::new(if step.optional { "yes" } else { "" }),
            Cell::new(&step.description),
        ]);
    }
    println!("{table}");

    if !plan.success_criteria.is_empty() {
        println!("{}", style("success criteria:").bold());
        for criterion in &plan.success_criteria {
            println!("  - {criterion}");
        }
    }

    Ok(())
}
