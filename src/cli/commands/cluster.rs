use crate::bio::fasta::parse_fasta;
use crate::cli::output::*;
use crate::cli::{output_dir, Context};
use crate::core::cluster_builder::{build_clusters, clusters_to_histograms};
use crate::core::paths;
use crate::storage::{write_table_with, TableFormat};
use crate::tools::configured_clusterer;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct ClusterArgs {
    /// Input protein FASTA
    #[arg(value_name = "FASTA")]
    pub input: PathBuf,

    /// Minimum fractional identity, in (0, 1]
    #[arg(short, long)]
    pub identity: f64,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Table format (parquet, tsv)
    #[arg(long)]
    pub format: Option<TableFormat>,
}

pub fn run(args: ClusterArgs, context: &Context) -> anyhow::Result<()> {
    let clusterer = configured_clusterer(&context.config)?;
    let sequences = parse_fasta(&args.input)?;

    let pb = spinner(&format!(
        "Clustering {} sequences at identity {}...",
        format_number(sequences.len()),
        args.identity
    ));
    let table = build_clusters(&clusterer, &sequences, args.identity)?;
    pb.finish_and_clear();

    let out_dir = output_dir(args.output_dir.as_deref(), &args.input);
    std::fs::create_dir_all(&out_dir)?;
    let stem = paths::stem_of(&args.input);
    let format = context.format(args.format);

    let clusters_path = paths::output_path(&out_dir, &stem, paths::CLUSTERS_SUFFIX, format);
    write_table_with(&table.to_table()?, &clusters_path, context.codec())?;
    let hist_path = paths::output_path(&out_dir, &stem, paths::HISTOGRAM_SUFFIX, format);
    write_table_with(
        &clusters_to_histograms(std::slice::from_ref(&table))?,
        &hist_path,
        context.codec(),
    )?;

    let singletons = table.clusters().iter().filter(|c| c.is_singleton()).count();
    section_header("Clusters");
    tree_section(&[
        ("Sequences", format_number(table.n_sequences())),
        ("Clusters", format_number(table.n_clusters())),
        ("Singletons", format_number(singletons)),
        ("Output", clusters_path.display().to_string()),
    ]);
    Ok(())
}
