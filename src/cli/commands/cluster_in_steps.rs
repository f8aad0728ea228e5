use crate::bio::fasta::parse_fasta;
use crate::cli::output::*;
use crate::cli::{output_dir, Context};
use crate::core::config::ScheduleOrder;
use crate::core::paths;
use crate::core::refiner::refine_in_steps;
use crate::storage::{write_table_with, TableFormat};
use crate::tools::configured_clusterer;
use clap::Args;
use comfy_table::Cell;
use std::path::PathBuf;

#[derive(Args)]
pub struct ClusterInStepsArgs {
    /// Input protein FASTA
    #[arg(value_name = "FASTA")]
    pub input: PathBuf,

    /// Identity schedule, comma separated (defaults to the configured one)
    #[arg(short, long, value_delimiter = ',')]
    pub schedule: Vec<f64>,

    /// Schedule runs from low to high identity
    #[arg(long)]
    pub ascending: bool,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Table format (parquet, tsv)
    #[arg(long)]
    pub format: Option<TableFormat>,
}

pub fn run(args: ClusterInStepsArgs, context: &Context) -> anyhow::Result<()> {
    let clustering = &context.config.clustering;
    let schedule = if args.schedule.is_empty() {
        clustering.schedule.clone()
    } else {
        args.schedule.clone()
    };
    let order = if args.ascending {
        ScheduleOrder::Ascending
    } else {
        clustering.order
    };

    let clusterer = configured_clusterer(&context.config)?;
    let sequences = parse_fasta(&args.input)?;
    let pb = spinner(&format!(
        "Clustering {} sequences over {} steps...",
        format_number(sequences.len()),
        schedule.len()
    ));
    let refinement = refine_in_steps(&clusterer, &sequences, &schedule, order)?;
    pb.finish_and_clear();

    let out_dir = output_dir(args.output_dir.as_deref(), &args.input);
    std::fs::create_dir_all(&out_dir)?;
    let stem = paths::stem_of(&args.input);
    let format = context.format(args.format);
    let codec = context.codec();

    let mut table = create_standard_table();
    table.set_header(vec![
        header_cell("Step"),
        header_cell("Identity"),
        header_cell("Inputs"),
        header_cell("Clusters"),
        header_cell("File"),
    ]);
    for (step, clusters) in refinement.steps.iter().enumerate() {
        let path = paths::step_path(&out_dir, &stem, step, clusters.identity, format);
        write_table_with(&clusters.to_table()?, &path, codec)?;
        table.add_row(vec![
            Cell::new(step),
            Cell::new(clusters.identity),
            Cell::new(format_number(clusters.n_sequences())),
            Cell::new(format_number(clusters.n_clusters())),
            Cell::new(path.display()),
        ]);
    }
    write_table_with(
        &refinement.hierarchy.lineage_table()?,
        paths::output_path(&out_dir, &stem, paths::LINEAGE_SUFFIX, format),
        codec,
    )?;
    write_table_with(
        &refinement.histograms,
        paths::output_path(&out_dir, &stem, paths::HISTOGRAM_SUFFIX, format),
        codec,
    )?;

    if !is_quiet() {
        println!("\n{}", table);
    }
    success(&format!(
        "{} sequences resolve to {} root clusters",
        format_number(sequences.len()),
        format_number(refinement.hierarchy.roots().len())
    ));
    Ok(())
}
