use crate::cli::output::*;
use crate::cli::{output_dir, report_diagnostics, Context};
use crate::core::homology::annotated_from_table;
use crate::core::paths;
use crate::core::synteny::{detector_for, map_synteny};
use crate::storage::{read_table, write_table_with, TableFormat};
use crate::tools::Direction;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct SyntenyArgs {
    /// Homology-annotated proteins table written by `annotate-homology`
    #[arg(value_name = "TABLE")]
    pub input: PathBuf,

    /// Largest position gap allowed inside a block
    #[arg(short = 'g', long)]
    pub max_gap: Option<u32>,

    /// Fewest anchors in a reported block
    #[arg(short = 'm', long)]
    pub min_block_len: Option<usize>,

    /// Also scan each proteome against itself
    #[arg(long)]
    pub self_synteny: bool,

    /// Output directory (defaults to the input's directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Table format (parquet, tsv)
    #[arg(long)]
    pub format: Option<TableFormat>,
}

pub fn run(args: SyntenyArgs, context: &Context) -> anyhow::Result<()> {
    let mut config = context.config.clone();
    if let Some(gap) = args.max_gap {
        config.synteny.max_gap = gap;
    }
    if let Some(len) = args.min_block_len {
        config.synteny.min_block_len = len;
    }
    config.synteny.self_synteny |= args.self_synteny;
    config.validate()?;

    let proteins = annotated_from_table(&read_table(&args.input)?)?;
    let detector = detector_for(&config)?;
    let diagnostics = context.diagnostics();

    let pb = spinner(&format!(
        "Scanning {} proteins with {}...",
        format_number(proteins.len()),
        detector.name()
    ));
    let map = map_synteny(&proteins, &config.synteny, detector.as_ref(), &diagnostics)?;
    pb.finish_and_clear();

    let out_dir = output_dir(args.output_dir.as_deref(), &args.input);
    std::fs::create_dir_all(&out_dir)?;
    let stem = paths::stem_of(&args.input);
    let stem = stem
        .strip_suffix(paths::ANNOTATED_SUFFIX)
        .unwrap_or(&stem)
        .to_string();
    let format = context.format(args.format);
    let proxy_path = paths::output_path(&out_dir, &stem, paths::PROXY_SUFFIX, format);
    write_table_with(&map.proxy_table()?, &proxy_path, context.codec())?;
    write_table_with(
        &map.fragments_table()?,
        paths::output_path(&out_dir, &stem, paths::FRAGMENTS_SUFFIX, format),
        context.codec(),
    )?;

    let reverse = map
        .blocks
        .iter()
        .filter(|b| b.direction == Direction::Reverse)
        .count();
    let synthesized = map.blocks.iter().filter(|b| b.synthesized).count();
    section_header("Synteny");
    tree_section(&[
        ("Blocks", format_number(map.blocks.len())),
        ("Reverse blocks", format_number(reverse)),
        ("Synthesized proxies", format_number(synthesized)),
        ("Fragments", format_number(map.fragments.len())),
        ("Output", proxy_path.display().to_string()),
    ]);
    report_diagnostics(&diagnostics);
    Ok(())
}
