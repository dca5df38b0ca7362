use std::path::Path;

use anyhow::{Context, Result, bail};
use lgx::lower_program;

use crate::report;

/// Lowers without writing anything. Any diagnostic fails the command.
pub fn run(file: &Path, config: Option<&Path>, source: Option<&Path>) -> Result<()> {
    let program = super::load_program(file)?;
    let config = super::load_config(config)?;
    let source_text = super::load_source(source)?;

    let lowered = lower_program(&program, &config)
        .context(format!("Failed to lower {}", file.display()))?;
    let filename = source.unwrap_or(file).display().to_string();
    report::print_all(&lowered.diagnostics, &filename, source_text.as_deref())?;

    if !lowered.diagnostics.is_empty() {
        bail!(
            "{} construct(s) could not be lowered in {}",
            lowered.diagnostics.len(),
            file.display()
        );
    }
    eprintln!(
        "{} lowers cleanly ({} nodes)",
        file.display(),
        lowered.graph.node_count()
    );
    Ok(())
}
