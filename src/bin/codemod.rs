//! CLI for the codemod engine.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use tsx_codemod::prelude::*;

#[derive(Parser)]
#[command(name = "codemod")]
#[command(version, about = "Batch source rewriting for the application tree", long_about = None)]
struct Cli {
    /// Root of the source tree
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Built-in pipeline to run
    #[arg(short, long, default_value = "legacy-layout")]
    pipeline: String,

    /// Include glob patterns
    #[arg(short, long, default_values_t = default_includes())]
    include: Vec<String>,

    /// Additional ignore glob patterns
    #[arg(long)]
    ignore: Vec<String>,

    /// Skip the conventional node_modules/build-output ignore set
    #[arg(long)]
    no_default_ignores: bool,

    /// Apply changes to disk (default is a dry run)
    #[arg(long)]
    write: bool,

    /// Print a unified diff for each changed file
    #[arg(long)]
    diff: bool,

    /// Emit the run report as JSON
    #[arg(long)]
    json: bool,
}

fn default_includes() -> Vec<String> {
    vec!["**/*.tsx".to_string(), "**/*.ts".to_string()]
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if !cli.path.is_dir() {
        bail!("root directory {} is not readable", cli.path.display());
    }

    let rules = catalog::pipeline(&cli.pipeline)
        .with_context(|| format!("cannot build pipeline '{}'", cli.pipeline))?;

    let mut codemod = Codemod::in_tree(&cli.path).rules(rules);
    for pattern in &cli.include {
        codemod = codemod.include(pattern.clone());
    }
    for pattern in &cli.ignore {
        codemod = codemod.ignore(pattern.clone());
    }
    if !cli.no_default_ignores {
        codemod = codemod.default_ignores();
    }
    if cli.write {
        codemod = codemod.write();
    }

    let report = codemod.run().context("codemod run failed")?;

    if cli.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    if cli.diff {
        for change in &report.changed {
            let rel = change.path.strip_prefix(&cli.path).unwrap_or(&change.path);
            print!("{}", unified_diff(&change.before, &change.after, rel));
            println!("{}", DiffSummary::from_diff(&change.before, &change.after));
        }
    }

    print!("{}", report.render(&cli.path));
    Ok(())
}
