//! Source type name → target class name.

use indexmap::IndexMap;

use crate::error::{LowerError, Result};

const STANDARD: &[(&str, &str)] = &[
    ("bool", "System.Boolean"),
    ("byte", "System.Byte"),
    ("sbyte", "System.SByte"),
    ("short", "System.Int16"),
    ("ushort", "System.UInt16"),
    ("char", "System.Char"),
    ("int", "System.Int32"),
    ("uint", "System.UInt32"),
    ("long", "System.Int64"),
    ("ulong", "System.UInt64"),
    ("float", "System.Single"),
    ("double", "System.Double"),
    ("string", "System.String"),
    ("object", "System.Object"),
    ("Color", "BaseX.color"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTable {
    targets: IndexMap<String, String>,
}

impl TypeTable {
    pub fn standard() -> Self {
        Self {
            targets: STANDARD
                .iter()
                .map(|(source, target)| (source.to_string(), target.to_string()))
                .collect(),
        }
    }

    /// Adds (or overrides) aliases.
    pub fn extend<'a>(&mut self, aliases: impl IntoIterator<Item = (&'a String, &'a String)>) {
        for (source, target) in aliases {
            self.targets.insert(source.clone(), target.clone());
        }
    }

    pub fn target(&self, source: &str) -> Result<&str> {
        self.targets
            .get(source)
            .map(String::as_str)
            .ok_or_else(|| LowerError::UnknownType(source.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.targets
            .iter()
            .map(|(source, target)| (source.as_str(), target.as_str()))
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::standard()
    }
}
