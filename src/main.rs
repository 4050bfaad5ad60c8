use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod build;
mod commands;
mod config;
mod util;

#[derive(Parser)]
struct Args {
    /// The command to execute
    #[command(subcommand)]
    command: ArtoCommand,
}

#[derive(Parser)]
struct BuildArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = "arto.conf")]
    config_file: PathBuf,

    /// Articles to rebuild, by stem or file name; empty builds everything
    articles: Vec<String>,
}

#[derive(Parser)]
struct CleanArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = "arto.conf")]
    config_file: PathBuf,

    /// Print what would be deleted without deleting anything
    #[arg(long, default_value = "false")]
    dry_run: bool,
}

#[derive(Subcommand)]
enum ArtoCommand {
    /// Generate the site from the article sources
    Build(BuildArgs),

    /// Delete the generated pages from the output directory
    Clean(CleanArgs),
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    match args.command {
        ArtoCommand::Build(args) => {
            commands::build::run(&args)?;
        }
        ArtoCommand::Clean(args) => {
            commands::clean::run(&args)?;
        }
    }

    Ok(())
}
