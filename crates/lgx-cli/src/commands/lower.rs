use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use lgx::lower_program;

use crate::{OutputFormat, encode, report};

pub fn run(
    file: &Path,
    config: Option<&Path>,
    format: OutputFormat,
    output: Option<&Path>,
    source: Option<&Path>,
) -> Result<()> {
    let program = super::load_program(file)?;
    let config = super::load_config(config)?;
    let source_text = super::load_source(source)?;

    let lowered = lower_program(&program, &config)
        .context(format!("Failed to lower {}", file.display()))?;
    log::info!(
        "lowered {} into {} nodes, {} records",
        file.display(),
        lowered.graph.node_count(),
        lowered.records().len()
    );

    let filename = source.unwrap_or(file).display().to_string();
    report::print_all(&lowered.diagnostics, &filename, source_text.as_deref())?;

    let records = lowered.graph.into_records();
    let text = match format {
        OutputFormat::Lgx => encode::to_text(&records),
        OutputFormat::Json => serde_json::to_string_pretty(&records)? + "\n",
    };
    match output {
        Some(path) => {
            fs::write(path, text).context(format!("Failed to write file: {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
