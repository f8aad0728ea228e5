use crate::cli::output::success;
use crate::cli::Context;
use crate::core::config::{save_config, to_toml, Config};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write the configuration to FILE instead of printing it
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Use built-in defaults, ignoring any configuration file
    #[arg(long)]
    pub defaults: bool,
}

pub fn run(args: ConfigArgs, context: &Context) -> anyhow::Result<()> {
    let config = if args.defaults {
        Config::default()
    } else {
        context.config.clone()
    };

    match &args.output {
        Some(path) => {
            save_config(path, &config)?;
            success(&format!("Wrote {}", path.display()));
        }
        None => {
            if let Some(source) = context.config_path.as_ref().filter(|_| !args.defaults) {
                println!("# from {}", source.display());
            }
            print!("{}", to_toml(&config)?);
        }
    }
    Ok(())
}
