//! `tagschema`: converge or revert the tags/taggings schema of a SQLite
//! database.
//!
//! ```
//! tagschema converge
//! tagschema revert
//! TAGSCHEMA_FORCE_TABLES_REMOVAL=yes tagschema revert
//! tagschema --config tagschema.toml status
//! ```

mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use settings::Settings;
use strum::IntoEnumIterator as _;
use tagschema_core::{Flag, Report, RevertOptions};
use tagschema_sqlite::Reconciler;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tagging schema reconciler")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tagschema.toml")]
  config: PathBuf,

  /// Print the run report as JSON on stdout.
  #[arg(long)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Bring the schema to the target shape.
  Converge,
  /// Undo the changes recorded in the ledger.
  Revert {
    /// Drop `tags` and `taggings` even if this tool did not create them.
    #[arg(long)]
    force_tables_removal: bool,
  },
  /// Show which ledger flags are set.
  Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let reconciler = Reconciler::open(&settings.database_path)
    .await
    .with_context(|| {
      format!("failed to open database at {:?}", settings.database_path)
    })?;

  match cli.command {
    Command::Converge => {
      let report = reconciler.converge().await.context("converge failed")?;
      print_report(&report, cli.json)?;
    }
    Command::Revert { force_tables_removal } => {
      let options = RevertOptions {
        force_tables_removal: force_tables_removal
          || settings.force_tables_removal,
      };
      let report = reconciler.revert(options).await.context("revert failed")?;
      print_report(&report, cli.json)?;
    }
    Command::Status => {
      let entries = reconciler.ledger().await.context("reading ledger")?;
      for flag in Flag::iter() {
        match entries.iter().find(|e| e.flag == flag) {
          Some(entry) => {
            println!("{:<28} set    {}", flag.as_str(), entry.applied_at)
          }
          None => println!("{:<28} unset", flag.as_str()),
        }
      }
    }
  }

  Ok(())
}

fn print_report(report: &Report, json: bool) -> anyhow::Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(report)?);
    return Ok(());
  }
  if report.is_noop() {
    println!("nothing to do");
  }
  for applied in &report.applied {
    println!("{:<24} {}", applied.step, applied.edit);
  }
  Ok(())
}
