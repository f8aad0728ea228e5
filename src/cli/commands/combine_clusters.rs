use crate::cli::output::*;
use crate::cli::Context;
use crate::core::cluster_builder::{combine_clusters, ClusterTable};
use crate::core::paths::get_paths_from_file;
use crate::storage::{read_table, write_table_with};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct CombineClustersArgs {
    /// Cluster tables to merge
    #[arg(value_name = "TABLE", required_unless_present = "list")]
    pub inputs: Vec<PathBuf>,

    /// File listing cluster tables, one per line
    #[arg(short, long, value_name = "FILE")]
    pub list: Option<PathBuf>,

    /// Combined cluster table
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,
}

pub fn run(args: CombineClustersArgs, context: &Context) -> anyhow::Result<()> {
    let mut inputs = args.inputs.clone();
    if let Some(list) = &args.list {
        inputs.extend(get_paths_from_file(list)?);
    }

    let tables = inputs
        .iter()
        .map(|path| {
            let table = read_table(path)?;
            ClusterTable::from_table(&table)
        })
        .collect::<crate::Result<Vec<_>>>()?;
    let combined = combine_clusters(&tables)?;
    write_table_with(&combined.to_table()?, &args.output, context.codec())?;

    success(&format!(
        "Combined {} tables into {} clusters over {} sequences: {}",
        tables.len(),
        format_number(combined.n_clusters()),
        format_number(combined.n_sequences()),
        args.output.display()
    ));
    Ok(())
}
