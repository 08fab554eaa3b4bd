//! `agentry tools` -- list available tools and capabilities.

use anyhow::Result;
use comfy_table::{Cell, ContentArrangement, Table, presets};

use crate::state::AppState;

pub fn handle(state: &AppState, json: bool) -> Result<()> {
    let catalog = state.registry.catalog();

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["capability", "tool", "parameters", "description"]);

    for entry in catalog.as_array().into_iter().flatten() {
        let parameters = entry["parameters"]
            .as_array()
            .into_iter()
            .flatten()
            .map(|p| {
                let name = p["name"].as_str().unwrap_or("?");
                if p["required"].as_bool().unwrap_or(false) {
                    name.to_string()
                } else {
                    format!("[{name}]")
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        table.add_row(vec![
            Cell::new(entry["name"].as_str().unwrap_or("")),
            Cell::new(entry["tool"].as_str().unwrap_or("")),
            Cell::new(parameters),
            Cell::new(entry["description"].as_str().unwrap_or("")),
        ]);
    }

    println!("{table}");
    Ok(())
}
