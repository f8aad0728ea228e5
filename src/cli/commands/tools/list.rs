use crate::cli::output::{create_standard_table, header_cell, is_quiet};
use crate::cli::Context;
use crate::tools::ToolManager;
use clap::Args;
use comfy_table::{Cell, Color};
use serde_json::json;

#[derive(Args)]
pub struct ListArgs {
    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn run(args: ListArgs, context: &Context) -> anyhow::Result<()> {
    let manager = ToolManager::new(&context.config);
    let tools = manager.list();

    match args.format.as_str() {
        "json" => {
            let rows: Vec<_> = tools
                .iter()
                .map(|status| {
                    json!({
                        "tool": status.tool.name(),
                        "binary": status.binary,
                        "path": status.path.as_ref().map(|p| p.display().to_string()),
                        "version": status.version,
                        "purpose": status.tool.purpose(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {
            if is_quiet() {
                return Ok(());
            }
            let mut table = create_standard_table();
            table.set_header(vec![
                header_cell("Tool"),
                header_cell("Purpose"),
                header_cell("Version"),
                header_cell("Status"),
                header_cell("Path"),
            ]);

            for status in &tools {
                let state = if status.is_available() {
                    Cell::new("found").fg(Color::Green)
                } else {
                    Cell::new("missing").fg(Color::Red)
                };
                table.add_row(vec![
                    Cell::new(status.tool.display_name()),
                    Cell::new(status.tool.purpose()),
                    Cell::new(status.version.as_deref().unwrap_or("-")),
                    state,
                    Cell::new(
                        status
                            .path
                            .as_ref()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|| status.binary.clone()),
                    ),
                ]);
            }

            println!("\nExternal Tools");
            println!("{}", table);

            if tools.iter().any(|s| !s.is_available()) {
                println!("\nSet the binary paths in the [clustering], [alignment] and [synteny] config sections");
            }
        }
    }

    Ok(())
}
