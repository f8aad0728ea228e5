use crate::cli::output::success;
use crate::cli::Context;
use crate::tools::{configured_aligner, configured_clusterer, configured_dagchainer, Tool};
use crate::tools::{Aligner, Clusterer};
use clap::Args;

#[derive(Args)]
pub struct CheckArgs {
    /// Tool to check (usearch, muscle, dagchainer)
    pub tool: Tool,
}

pub fn run(args: CheckArgs, context: &Context) -> anyhow::Result<()> {
    match args.tool {
        Tool::Usearch => configured_clusterer(&context.config)?.verify_installation()?,
        Tool::Muscle => configured_aligner(&context.config)?.verify_installation()?,
        Tool::Dagchainer => {
            configured_dagchainer(&context.config)?;
        }
    }
    success(&format!("{} is available", args.tool.display_name()));
    Ok(())
}
