use crate::bio::fasta::parse_fasta;
use crate::cli::output::*;
use crate::cli::Context;
use crate::core::align::align_clusters;
use crate::core::cluster_builder::ClusterTable;
use crate::storage::read_table;
use crate::tools::configured_aligner;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct AlignArgs {
    /// Cluster table
    #[arg(value_name = "CLUSTERS")]
    pub clusters: PathBuf,

    /// FASTA holding every clustered sequence
    #[arg(value_name = "FASTA")]
    pub sequences: PathBuf,

    /// Directory for the per-cluster alignments
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Smallest cluster to align
    #[arg(long, default_value = "2")]
    pub min_size: usize,
}

pub fn run(args: AlignArgs, context: &Context) -> anyhow::Result<()> {
    let aligner = configured_aligner(&context.config)?;
    let table = ClusterTable::from_table(&read_table(&args.clusters)?)?;
    let sequences = parse_fasta(&args.sequences)?;

    let pb = spinner("Aligning clusters...");
    let written = align_clusters(
        &aligner,
        &table,
        &sequences,
        &args.output_dir,
        args.min_size,
    )?;
    pb.finish_and_clear();

    success(&format!(
        "Wrote {} alignments to {}",
        format_number(written.len()),
        args.output_dir.display()
    ));
    Ok(())
}
