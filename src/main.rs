use azulejo::cli::commands;
use azulejo::cli::{output, Cli, Commands, Context};
use azulejo::AzulejoError;
use clap::Parser;
use colored::*;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    output::init(cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(exit_code(&e));
    }
}

/// `RUST_LOG` wins, then `AZULEJO_LOG`, then the `-v`/`-q` flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("AZULEJO_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<AzulejoError>() {
        Some(AzulejoError::Config(_)) => 2,
        Some(AzulejoError::Io(_)) | Some(AzulejoError::InputNotFound(_)) => 3,
        Some(AzulejoError::Parse(_)) | Some(AzulejoError::UnrecognizedFormat(_)) => 4,
        Some(AzulejoError::ClusteringTool(_))
        | Some(AzulejoError::AlignmentTool(_))
        | Some(AzulejoError::SyntenyTool(_)) => 5,
        Some(AzulejoError::Degenerate(_)) => 6,
        _ => 1,
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Configure thread pool
    let num_threads = if cli.threads == 0 {
        num_cpus::get()
    } else {
        cli.threads
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;
    tracing::debug!("Using {} threads", num_threads);

    let context = Context::from_cli(&cli)?;

    match cli.command {
        Commands::Ingest(args) => commands::ingest::run(args, &context),
        Commands::Index(args) => commands::index::run(args, &context),
        Commands::Cluster(args) => commands::cluster::run(args, &context),
        Commands::ClusterInSteps(args) => commands::cluster_in_steps::run(args, &context),
        Commands::CombineClusters(args) => commands::combine_clusters::run(args, &context),
        Commands::AdjacencyToClusters(args) => {
            commands::adjacency_to_clusters::run(args, &context)
        }
        Commands::AnnotateHomology(args) => commands::annotate_homology::run(args, &context),
        Commands::Synteny(args) => commands::synteny::run(args, &context),
        Commands::CompareClusters(args) => commands::compare_clusters::run(args, &context),
        Commands::Align(args) => commands::align::run(args, &context),
        Commands::Tools(args) => commands::tools::run(args, &context),
        Commands::Config(args) => commands::config::run(args, &context),
    }
}
