//! Lowering options. Every field has a default, so an empty TOML table (or no
//! file at all) yields the stock output.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::TypeTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoweringConfig {
    /// Title carried by the program declaration record.
    pub program_title: String,
    pub format_version: u32,
    pub layout: LayoutConfig,
    /// Extra source → target type aliases, applied over the standard table.
    pub types: IndexMap<String, String>,
}

impl Default for LoweringConfig {
    fn default() -> Self {
        Self {
            program_title: "Test program".to_string(),
            format_version: 2,
            layout: LayoutConfig::default(),
            types: IndexMap::new(),
        }
    }
}

impl LoweringConfig {
    pub fn type_table(&self) -> TypeTable {
        let mut table = TypeTable::standard();
        table.extend(&self.types);
        table
    }
}

/// Cosmetic node placement steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical gap between consecutive nodes of a column.
    pub row_step: i32,
    /// Horizontal gap before operator and built-in nodes.
    pub column_step: i32,
    /// Horizontal gap before each routine.
    pub routine_step: i32,
    /// Horizontal gap after a routine's parameter reads.
    pub parameter_step: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_step: 75,
            column_step: 150,
            routine_step: 700,
            parameter_step: 300,
        }
    }
}
