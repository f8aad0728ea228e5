use crate::cli::output::*;
use crate::cli::Context;
use crate::core::cluster_builder::{adjacency_from_table, adjacency_to_clusters};
use crate::storage::{read_table, write_table_with};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct AdjacencyToClustersArgs {
    /// Adjacency table with `a` and `b` id columns
    #[arg(value_name = "TABLE")]
    pub input: PathBuf,

    /// Identity recorded on the resulting clusters
    #[arg(short, long, default_value = "1.0")]
    pub identity: f64,

    /// Cluster table to write
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,
}

pub fn run(args: AdjacencyToClustersArgs, context: &Context) -> anyhow::Result<()> {
    let table = read_table(&args.input)?;
    let (ids, edges) = adjacency_from_table(&table)?;
    let clusters = adjacency_to_clusters(&ids, &edges, args.identity)?;
    write_table_with(&clusters.to_table()?, &args.output, context.codec())?;

    success(&format!(
        "{} edges over {} ids give {} clusters: {}",
        format_number(edges.len()),
        format_number(ids.len()),
        format_number(clusters.n_clusters()),
        args.output.display()
    ));
    Ok(())
}
