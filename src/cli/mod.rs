pub mod commands;
pub mod output;

use crate::core::config::{load_config, Config};
use crate::core::diagnostics::Diagnostics;
use crate::storage::{Codec, TableFormat};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Configuration file picked up from the working directory when `--config`
/// is not given.
pub const DEFAULT_CONFIG_FILE: &str = "azulejo.toml";

#[derive(Parser)]
#[command(
    name = "azulejo",
    version,
    about = "Cluster homologous proteins across proteomes and anchor them in syntenic context",
    long_about = "Azulejo clusters proteins from many proteomes at a schedule of identity \
                  thresholds, annotates the resulting homology groups, and reconciles them \
                  against genomic positions to find colinear synteny blocks."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Treat degenerate-input warnings as errors
    #[arg(short = 'e', long, global = true)]
    pub strict: bool,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "AZULEJO_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of threads to use (0 = all available)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read a proteome manifest into proteome and protein tables
    Ingest(commands::ingest::IngestArgs),

    /// Count, trim or split the records of a FASTA file
    Index(commands::index::IndexArgs),

    /// Cluster sequences at one identity threshold
    Cluster(commands::cluster::ClusterArgs),

    /// Cluster at a schedule of identities, feeding representatives forward
    ClusterInSteps(commands::cluster_in_steps::ClusterInStepsArgs),

    /// Merge cluster tables over disjoint sequence sets
    CombineClusters(commands::combine_clusters::CombineClustersArgs),

    /// Turn a pairwise adjacency table into connected-component clusters
    AdjacencyToClusters(commands::adjacency_to_clusters::AdjacencyToClustersArgs),

    /// Annotate proteins with homology clusters and length statistics
    AnnotateHomology(commands::annotate_homology::AnnotateHomologyArgs),

    /// Detect synteny blocks and assign proxy genes
    Synteny(commands::synteny::SyntenyArgs),

    /// Compare two cluster tables
    CompareClusters(commands::compare_clusters::CompareClustersArgs),

    /// Align the members of every multi-member cluster
    Align(commands::align::AlignArgs),

    /// Show the external tools azulejo uses
    Tools(commands::tools::ToolsArgs),

    /// Show or write the effective configuration
    Config(commands::config::ConfigArgs),
}

/// Settings resolved from the global flags and the configuration file.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    /// Where the configuration came from, if not built-in defaults.
    pub config_path: Option<PathBuf>,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let config_path = match &cli.config {
            Some(path) => Some(path.clone()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
        };
        let mut config = match &config_path {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };
        config.strict |= cli.strict;
        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(self.config.strict)
    }

    pub fn format(&self, overridden: Option<TableFormat>) -> TableFormat {
        overridden.unwrap_or(self.config.output.format)
    }

    pub fn codec(&self) -> Codec {
        self.config.output.codec
    }
}

/// Output directory argument, defaulting to the directory holding `input`.
pub fn output_dir(explicit: Option<&Path>, input: &Path) -> PathBuf {
    match explicit {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

/// Warn the user when lenient mode let degenerate input through.
pub fn report_diagnostics(diagnostics: &Diagnostics) {
    let n = diagnostics.warnings();
    if n > 0 {
        output::warning(&format!(
            "{} degenerate input record(s) were skipped; rerun with -v for details or --strict to fail",
            n
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_output_dir_defaults_to_input_parent() {
        assert_eq!(
            output_dir(None, Path::new("data/a.faa")),
            PathBuf::from("data")
        );
        assert_eq!(output_dir(None, Path::new("a.faa")), PathBuf::from("."));
        assert_eq!(
            output_dir(Some(Path::new("out")), Path::new("data/a.faa")),
            PathBuf::from("out")
        );
    }

    #[test]
    fn test_strict_flag_overrides_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("azulejo.toml");
        std::fs::write(&path, "strict = false\n").unwrap();
        let path = path.to_str().unwrap();

        let cli = Cli::parse_from(["azulejo", "--config", path, "config"]);
        assert!(!Context::from_cli(&cli).unwrap().config.strict);

        let cli = Cli::parse_from(["azulejo", "-e", "--config", path, "config"]);
        let context = Context::from_cli(&cli).unwrap();
        assert!(context.config.strict);
        assert!(context.diagnostics().is_strict());
    }
}
