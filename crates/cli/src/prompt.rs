use anyhow::{bail, Result};
use console::{style, Term};
use dialoguer::{Confirm, Input};
use std::path::PathBuf;

/// Warn, confirm, then ask for whichever path was not supplied
pub(crate) fn ask_paths(
    table: Option<PathBuf>,
    source_dir: Option<PathBuf>,
    assume_yes: bool,
) -> Result<(PathBuf, PathBuf)> {
    let term = Term::stderr();

    term.write_line(&style("===== WARNING =====").red().bold().to_string())?;
    term.write_line("This tool rewrites files and provides no way to undo it.")?;
    term.write_line("Only point it at directories managed by source control.")?;
    term.write_line("")?;

    if !assume_yes {
        let proceed = Confirm::new()
            .with_prompt("Continue?")
            .default(false)
            .interact_on(&term)?;
        if !proceed {
            bail!("Aborted by user");
        }
    }

    let table = match table {
        Some(path) => path,
        None => ask_path(&term, "Resource table (.resx or .json)")?,
    };
    let source_dir = match source_dir {
        Some(path) => path,
        None => ask_path(&term, "Source directory to update")?,
    };
    Ok((table, source_dir))
}

fn ask_path(term: &Term, prompt: &str) -> Result<PathBuf> {
    let raw: String = Input::new()
        .with_prompt(prompt)
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.trim().is_empty() {
                Err("a path is required")
            } else {
                Ok(())
            }
        })
        .interact_text_on(term)?;
    Ok(PathBuf::from(raw.trim()))
}
