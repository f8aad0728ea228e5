use crate::bio::index::{fasta_records, split_fasta, trim_fasta};
use crate::cli::output::*;
use crate::cli::{output_dir, Context};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct IndexArgs {
    /// Input FASTA file (uncompressed)
    #[arg(value_name = "FASTA")]
    pub input: PathBuf,

    /// Truncate the file in place after N records
    #[arg(long, value_name = "N", conflicts_with = "split")]
    pub trim: Option<usize>,

    /// Split into chunk files of N records each
    #[arg(long, value_name = "N")]
    pub split: Option<usize>,

    /// Directory for split chunks (defaults to the input's directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

pub fn run(args: IndexArgs, _context: &Context) -> anyhow::Result<()> {
    if let Some(keep) = args.trim {
        let before = trim_fasta(&args.input, keep)?;
        let kept = keep.min(before.records());
        print_stats_table(
            "Trim",
            &[
                ("Records before", format_number(before.records())),
                ("Records kept", format_number(kept)),
                ("Size before", format_bytes(before.total_bytes as u64)),
            ],
        );
        success(&format!("Trimmed {}", args.input.display()));
        return Ok(());
    }

    if let Some(per_file) = args.split {
        let out_dir = output_dir(args.output_dir.as_deref(), &args.input);
        let chunks = split_fasta(&args.input, per_file, &out_dir)?;
        section_header(&format!("Split into {} files", chunks.len()));
        for (i, chunk) in chunks.iter().enumerate() {
            tree_item(i + 1 == chunks.len(), &chunk.display().to_string(), None);
        }
        return Ok(());
    }

    let index = fasta_records(&args.input)?;
    print_stats_table(
        &args.input.display().to_string(),
        &[
            ("Records", format_number(index.records())),
            ("Size", format_bytes(index.total_bytes as u64)),
        ],
    );
    Ok(())
}
