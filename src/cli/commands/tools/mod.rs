pub mod check;
pub mod list;

use crate::cli::Context;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ToolsArgs {
    #[command(subcommand)]
    pub command: ToolsCommands,
}

#[derive(Subcommand)]
pub enum ToolsCommands {
    /// List the external tools and where they were found
    List(list::ListArgs),

    /// Fail unless a tool can be found and runs
    Check(check::CheckArgs),
}

pub fn run(args: ToolsArgs, context: &Context) -> anyhow::Result<()> {
    match args.command {
        ToolsCommands::List(args) => list::run(args, context),
        ToolsCommands::Check(args) => check::run(args, context),
    }
}
