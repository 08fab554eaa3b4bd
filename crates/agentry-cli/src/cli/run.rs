//! `agentry run` -- plan, execute, and verify a task.

use std::path::Path;

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde_json::json;

use agentry_core::agent::{Planner, Verifier};
use agentry_core::engine::executor::PlanExecutor;
use agentry_core::plan::{load_plan_file, validate_plan};
use agentry_types::outcome::ExecutionResult;
use agentry_types::plan::Plan;
use agentry_types::verify::VerifiedOutcome;

use crate::state::AppState;

pub async fn handle(
    state: &AppState,
    task: Option<&str>,
    plan_file: Option<&Path>,
    no_verify: bool,
    json: bool,
) -> Result<()> {
    // Obtain the plan: a pre-authored file, or the planner.
    let plan = match plan_file {
        Some(path) => {
            let plan = load_plan_file(path)
                .with_context(|| format!("failed to load plan file {}", path.display()))?;
            validate_plan(&plan, &state.registry).context("plan file failed validation")?;
            plan
        }
        None => {
            let Some(task) = task else {
                bail!("either a task description or --plan <file> is required");
            };
            let (provider, model) = state.provider()?;
            let planner = Planner::new(provider, model)
                .with_temperature(state.config.llm.planner_temperature)
                .with_max_tokens(state.config.llm.max_completion_tokens);
            planner
                .create_plan(task, &state.registry)
                .await
                .context("plan creation failed")?
        }
    };

    if !json {
        eprintln!(
            "{} {} ({} steps)",
            style("executing plan").bold(),
            plan.task_description,
            plan.steps.len()
        );
    }

    let executor = PlanExecutor::new(&state.registry, state.config.retry);
    let result = executor.execute(&plan).await;

    // Verification is skipped when asked, or when executing a plan file
    // with no task to verify against.
    let task_text = task.unwrap_or(plan.task_description.as_str()).to_string();
    let verified = if no_verify {
        None
    } else {
        let (provider, model) = state.provider()?;
        let verifier = Verifier::new(provider, model)
            .with_temperature(state.config.llm.verifier_temperature);
        match verifier.verify(&task_text, &plan, &result).await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                tracing::warn!(error = %err, "verification failed, reporting raw result");
                None
            }
        }
    };

    if json {
        let output = json!({
            "execution": result,
            "verification": verified,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        render_result(&plan, &result, verified.as_ref());
    }

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn render_result(plan: &Plan, result: &ExecutionResult, verified: Option<&VerifiedOutcome>) {
    let summary = &result.execution_summary;
    let status = if result.is_success() {
        style(result.status.to_string()).green().bold()
    } else {
        style(result.status.to_string()).red().bold()
    };

    println!(
        "\n{status}  {}/{} steps succeeded, {} failed, {} partial ({:.2}s)",
        summary.successful_steps,
        summary.total_steps,
        summary.failed_steps,
        summary.partial_steps,
        summary.total_execution_time
    );

    if let Some(error) = &result.error {
        println!("{} {error}", style("error:").red().bold());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["step", "capability", "status", "detail"]);

    for report in &result.results.successful {
        table.add_row(vec![
            Cell::new(&report.step_id),
            Cell::new(&report.capability),
            Cell::new("success").fg(Color::Green),
            Cell::new(format!("{:.2}s", report.execution_time.unwrap_or(0.0))),
        ]);
    }
    for report in &result.results.partial {
        table.add_row(vec![
            Cell::new(&report.step_id),
            Cell::new(&report.capability),
            Cell::new("partial").fg(Color::Yellow),
            Cell::new(format!("{:.2}s", report.execution_time.unwrap_or(0.0))),
        ]);
    }
    for report in &result.results.failed {
        table.add_row(vec![
            Cell::new(&report.step_id),
            Cell::new(&report.capability),
            Cell::new("failed").fg(Color::Red),
            Cell::new(report.error.as_deref().unwrap_or("")),
        ]);
    }

    // Steps that never executed (gated out or behind an abort).
    for step in &plan.steps {
        let executed = result
            .results
            .successful
            .iter()
            .chain(&result.results.partial)
            .chain(&result.results.failed)
            .any(|r| r.step_id == step.id);
        if !executed {
            table.add_row(vec![
                Cell::new(&step.id),
                Cell::new(&step.capability),
                Cell::new("not run").fg(Color::DarkGrey),
                Cell::new(""),
            ]);
        }
    }

    println!("{table}");

    if let Some(outcome) = verified {
        let verdict = if outcome.success {
            style("verified").green().bold()
        } else {
            style("flagged").yellow().bold()
        };
        println!(
            "\n{verdict}  quality {:.2}",
            outcome.verification.quality_score
        );
        if let Some(summary) = outcome.final_output.get("summary").and_then(|s| s.as_str()) {
            println!("{summary}");
        }
        for issue in &outcome.verification.issues {
            println!("  {} {issue}", style("issue:").yellow());
        }
    }
}
