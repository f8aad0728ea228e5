use crate::cli::output::*;
use crate::cli::Context;
use crate::core::cluster_builder::ClusterTable;
use crate::core::compare::compare_clusters;
use crate::storage::{read_table, write_table_with};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct CompareClustersArgs {
    /// First cluster table
    #[arg(value_name = "A")]
    pub a: PathBuf,

    /// Second cluster table
    #[arg(value_name = "B")]
    pub b: PathBuf,

    /// Also write the summary as a table
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// List the ids found in only one table
    #[arg(long)]
    pub show_ids: bool,
}

pub fn run(args: CompareClustersArgs, context: &Context) -> anyhow::Result<()> {
    let a = ClusterTable::from_table(&read_table(&args.a)?)?;
    let b = ClusterTable::from_table(&read_table(&args.b)?)?;
    let report = compare_clusters(&a, &b);

    print_stats_table(
        "Cluster comparison",
        &[
            ("Clusters in A", format_number(report.clusters_a)),
            ("Clusters in B", format_number(report.clusters_b)),
            ("Identical", format_number(report.identical)),
            ("Split in B", format_number(report.splits)),
            ("Merged in B", format_number(report.merges)),
            ("Only in A", format_number(report.only_in_a.len())),
            ("Only in B", format_number(report.only_in_b.len())),
        ],
    );

    if args.show_ids && !is_quiet() {
        for (label, ids) in [("A", &report.only_in_a), ("B", &report.only_in_b)] {
            if ids.is_empty() {
                continue;
            }
            section_header(&format!("Only in {}", label));
            for (i, id) in ids.iter().enumerate() {
                tree_item(i + 1 == ids.len(), id, None);
            }
        }
    }

    if let Some(path) = &args.output {
        write_table_with(&report.to_table()?, path, context.codec())?;
        success(&format!("Wrote {}", path.display()));
    }
    Ok(())
}
