mod shell;

use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use vax_core::*;

#[derive(Parser)]
#[command(name = "vaxsched")]
#[command(about = "Vaccine appointment scheduling system", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive command shell (default)
    Shell,

    /// Write every appointment in the ledger to a CSV file
    Export {
        /// Destination CSV file
        #[arg(long)]
        out: PathBuf,
    },

    /// Write a default config file to --config or the standard location
    InitConfig,
}

fn main() -> Result<()> {
    // Initialize logging
    vax_core::logging::init();

    let cli = Cli::parse();

    if let Some(Commands::InitConfig) = cli.command {
        let path = cli.config.unwrap_or_else(Config::default_config_path);
        return cmd_init_config(&path);
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let scheduler = Scheduler::open(&data_dir, &config)?;

    match cli.command {
        Some(Commands::Export { out }) => cmd_export(&scheduler, out),
        Some(Commands::InitConfig) => Ok(()),
        Some(Commands::Shell) | None => {
            let stdin = io::stdin();
            shell::run(&scheduler, stdin.lock())
        }
    }
}

fn cmd_init_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(Error::Config(format!(
            "{} already exists, not overwriting",
            path.display()
        )));
    }
    Config::default().save_to(path)?;
    println!("✓ Wrote default config");
    println!("  Config: {}", path.display());
    Ok(())
}

fn cmd_export(scheduler: &Scheduler<FileStore>, out: PathBuf) -> Result<()> {
    let count = scheduler.export_ledger(&out)?;
    println!("✓ Exported {} appointments", count);
    println!("  CSV: {}", out.display());
    Ok(())
}
