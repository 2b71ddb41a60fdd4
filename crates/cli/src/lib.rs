use anyhow::{bail, Context as AnyhowContext, Result};
use clap::Parser;
use console::style;
use resmerge_core::{MergeConfig, MergeReport, ResourceMerger};
use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

mod prompt;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "resmerge")]
#[command(
    about = "Merge resource keys that share a value and rewrite references to the surviving key",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Resource table to deduplicate (.resx or .json)
    #[arg(env = "RESMERGE_TABLE", value_name = "TABLE")]
    table: Option<PathBuf>,

    /// Source directory whose references are rewritten
    #[arg(env = "RESMERGE_SOURCE_DIR", value_name = "SOURCE_DIR")]
    source_dir: Option<PathBuf>,

    /// TOML configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Source file extensions to scan, comma separated (default: cs,cshtml)
    #[arg(long = "ext", value_name = "EXT", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Skip files matched by .gitignore/.ignore rules
    #[arg(long)]
    respect_gitignore: bool,

    /// Only replace keys that stand as whole identifiers
    #[arg(long)]
    whole_identifier: bool,

    /// Overwrite files directly instead of via a temporary file
    #[arg(long)]
    in_place: bool,

    /// Abort on the first source file that cannot be rewritten
    #[arg(long)]
    fail_fast: bool,

    /// Substring marking the preferred key of a duplicate group
    #[arg(long, value_name = "TEXT")]
    marker: Option<String>,

    /// Write the markdown report to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Print the report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Do not ask for confirmation in interactive mode
    #[arg(short = 'y', long)]
    yes: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long)]
    quiet: bool,
}

impl Cli {
    /// Defaults, then the TOML file, then flags
    fn merge_config(&self) -> Result<MergeConfig> {
        let mut config = match &self.config {
            Some(path) => MergeConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => MergeConfig::default(),
        };

        if !self.extensions.is_empty() {
            config.scan.extensions = self.extensions.clone();
        }
        if self.respect_gitignore {
            config.scan.respect_gitignore = true;
        }
        if self.whole_identifier {
            config.whole_identifier = true;
        }
        if self.in_place {
            config.atomic_writes = false;
        }
        if self.fail_fast {
            config.fail_fast = true;
        }
        if let Some(marker) = &self.marker {
            config.canonical_marker = marker.clone();
        }
        Ok(config)
    }

    fn paths(&self) -> Result<(PathBuf, PathBuf)> {
        if let (Some(table), Some(source_dir)) = (&self.table, &self.source_dir) {
            return Ok((table.clone(), source_dir.clone()));
        }

        if !io::stdin().is_terminal() {
            bail!(
                "Missing resource table or source directory: pass both as arguments \
                 or set RESMERGE_TABLE and RESMERGE_SOURCE_DIR"
            );
        }

        prompt::ask_paths(self.table.clone(), self.source_dir.clone(), self.yes)
    }
}

pub fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // stdout carries the JSON report; keep logs to warnings
    if cli.json {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = cli.merge_config()?;
    let merger = ResourceMerger::new(config).context("Invalid configuration")?;
    let (table, source_dir) = cli.paths()?;

    let report = merger
        .run(&table, &source_dir)
        .with_context(|| format!("Failed to merge resources from {}", table.display()))?;

    emit_report(&cli, &report)?;

    if !cli.quiet {
        let summary = if report.failures.is_empty() {
            style("Resource merging completed.").green()
        } else {
            style("Resource merging completed with skipped files.").yellow()
        };
        eprintln!("{summary}");
    }

    Ok(())
}

fn emit_report(cli: &Cli, report: &MergeReport) -> Result<()> {
    if let Some(path) = &cli.report {
        fs::write(path, report.render_text())
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        log::info!("Report written to {}", path.display());
    }

    if cli.json {
        print_stdout(&serde_json::to_string_pretty(report)?)?;
    } else if cli.report.is_none() {
        print_stdout(report.render_text().trim_end())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("resmerge.toml");
        fs::write(
            &config_path,
            "canonical_marker = \"Shared\"\nfail_fast = true\n\n[scan]\nextensions = [\"xaml\"]\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "resmerge",
            "--config",
            config_path.to_str().unwrap(),
            "--ext",
            "cs,.razor",
            "--in-place",
            "Strings.resx",
            "src",
        ]);
        let config = cli.merge_config().unwrap();

        assert_eq!(config.scan.extensions, vec!["cs", ".razor"]);
        assert_eq!(config.canonical_marker, "Shared");
        assert!(config.fail_fast);
        assert!(!config.atomic_writes);
        assert!(!config.whole_identifier);
    }

    #[test]
    fn positional_paths_skip_prompts() {
        let cli = Cli::parse_from(["resmerge", "Strings.resx", "src"]);
        let (table, source_dir) = cli.paths().unwrap();
        assert_eq!(table, PathBuf::from("Strings.resx"));
        assert_eq!(source_dir, PathBuf::from("src"));
    }
}
