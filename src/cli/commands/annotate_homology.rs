use crate::cli::output::*;
use crate::cli::{output_dir, report_diagnostics, Context};
use crate::core::cluster_builder::ClusterTable;
use crate::core::homology::annotate_homology;
use crate::core::paths;
use crate::core::proteome::proteins_from_table;
use crate::storage::{read_table, write_table_with, TableFormat};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct AnnotateHomologyArgs {
    /// Proteins table written by `ingest`
    #[arg(short, long, value_name = "FILE")]
    pub proteins: PathBuf,

    /// Cluster tables: one, or every step of `cluster-in-steps` in order
    #[arg(value_name = "CLUSTERS", required = true)]
    pub clusters: Vec<PathBuf>,

    /// Output directory (defaults to the proteins table's directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Table format (parquet, tsv)
    #[arg(long)]
    pub format: Option<TableFormat>,
}

pub fn run(args: AnnotateHomologyArgs, context: &Context) -> anyhow::Result<()> {
    let proteins = proteins_from_table(&read_table(&args.proteins)?)?;
    let tables = args
        .clusters
        .iter()
        .map(|path| ClusterTable::from_table(&read_table(path)?))
        .collect::<crate::Result<Vec<_>>>()?;

    let diagnostics = context.diagnostics();
    let annotation = annotate_homology(
        &proteins,
        &tables,
        &context.config.homology,
        &diagnostics,
    )?;

    let out_dir = output_dir(args.output_dir.as_deref(), &args.proteins);
    std::fs::create_dir_all(&out_dir)?;
    let stem = paths::stem_of(&args.proteins);
    let format = context.format(args.format);
    let codec = context.codec();
    let outputs = [
        (paths::ANNOTATED_SUFFIX, annotation.proteins_table()?),
        (paths::STATS_SUFFIX, annotation.stats_table()?),
        (paths::ANY_IDS_SUFFIX, annotation.any_ids_table()?),
        (paths::ALL_IDS_SUFFIX, annotation.all_ids_table()?),
    ];
    for (suffix, table) in &outputs {
        write_table_with(table, paths::output_path(&out_dir, &stem, suffix, format), codec)?;
    }

    let outliers: usize = annotation.stats.iter().map(|s| s.n_outliers).sum();
    section_header("Homology");
    tree_section(&[
        ("Proteins", format_number(annotation.proteins.len())),
        ("Proteomes", format_number(annotation.n_proteomes)),
        ("Homology clusters", format_number(annotation.stats.len())),
        ("Length outliers", format_number(outliers)),
        (
            "Output",
            paths::output_path(&out_dir, &stem, paths::ANNOTATED_SUFFIX, format)
                .display()
                .to_string(),
        ),
    ]);
    report_diagnostics(&diagnostics);
    Ok(())
}
