pub mod catalog;
pub mod check;
pub mod lower;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use lgx::{LoweringConfig, Program};

/// Reads a program tree from its JSON form.
pub fn load_program(path: &Path) -> Result<Program> {
    let text = fs::read_to_string(path)
        .context(format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&text).context(format!("Failed to parse program: {}", path.display()))
}

/// Lowering settings from a TOML file, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<LoweringConfig> {
    let Some(path) = path else {
        return Ok(LoweringConfig::default());
    };
    let text = fs::read_to_string(path)
        .context(format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&text).context(format!("Failed to parse config: {}", path.display()))
}

/// Source text used to render diagnostic spans.
pub fn load_source(path: Option<&Path>) -> Result<Option<String>> {
    path.map(|path| {
        fs::read_to_string(path).context(format!("Failed to read source: {}", path.display()))
    })
    .transpose()
}
