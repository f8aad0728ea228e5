use crate::cli::output::*;
use crate::cli::{output_dir, Context};
use crate::core::paths;
use crate::core::proteome::{ingest_to_dir, Manifest};
use crate::storage::TableFormat;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct IngestArgs {
    /// Proteome manifest (TOML, one [[proteome]] table per proteome)
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Output directory (defaults to the manifest's directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Table format (parquet, tsv)
    #[arg(long)]
    pub format: Option<TableFormat>,
}

pub fn run(args: IngestArgs, context: &Context) -> anyhow::Result<()> {
    let manifest = Manifest::load(&args.manifest)?;
    let out_dir = output_dir(args.output_dir.as_deref(), &args.manifest);
    let format = context.format(args.format);

    let pb = spinner(&format!(
        "Reading {} proteomes...",
        manifest.proteomes.len()
    ));
    let ingested = ingest_to_dir(&manifest, &out_dir, format, context.codec())?;
    pb.finish_and_clear();

    section_header("Ingest");
    tree_section(&[
        ("Proteomes", format_number(ingested.proteomes.n_rows())),
        ("Proteins", format_number(ingested.proteins.n_rows())),
        (
            "Proteins table",
            paths::table_path(&out_dir, paths::PROTEINS_TABLE, format)
                .display()
                .to_string(),
        ),
        (
            "Combined FASTA",
            out_dir.join(paths::COMBINED_FASTA).display().to_string(),
        ),
    ]);
    success("Ingest complete");
    Ok(())
}
