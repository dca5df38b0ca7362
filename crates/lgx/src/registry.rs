//! Catalogue of known node kinds and their typed connectors.
//!
//! Pure lookup table: filled once (see [`crate::catalog`]) and only read while
//! lowering. Kinds are keyed by their fully-qualified class name; a generic
//! instantiation such as `Data.ValueRegister<System.Single>` resolves through
//! its unparameterized prefix.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use smallvec::SmallVec;

use crate::error::{LowerError, Result};

/// Namespace every target class lives under.
pub const NAMESPACE: &str = "FrooxEngine.LogiX.";

/// Placeholder for the first generic argument in connector types.
pub const GENERIC_ARGUMENT: &str = "`1";

/// Prefixes a short kind name (`Input.IntInput`) with the target namespace.
pub fn qualified(kind: &str) -> String {
    if kind.starts_with(NAMESPACE) {
        kind.to_string()
    } else {
        format!("{NAMESPACE}{kind}")
    }
}

/// Text before the first generic-argument delimiter.
pub fn generic_base(kind: &str) -> &str {
    kind.split('<').next().unwrap_or(kind)
}

/// Generic argument of `Kind<Arg>`, if any.
pub fn generic_argument(kind: &str) -> Option<&str> {
    let start = kind.find('<')?;
    let end = kind.rfind('>')?;
    (end > start).then(|| &kind[start + 1..end])
}

/// Named, typed attachment point on a kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    pub name: String,
    pub ty: String,
}

impl Connector {
    pub fn new(name: &str, ty: &str) -> Self {
        Self {
            name: name.to_string(),
            ty: ty.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindInfo {
    pub class_name: String,
    pub inputs: SmallVec<[Connector; 4]>,
    pub outputs: SmallVec<[Connector; 2]>,
    /// Index into `outputs` used when a consumer names no output.
    pub default_output: Option<usize>,
    /// Impulse inputs.
    pub methods: SmallVec<[String; 2]>,
    /// Impulse outputs. A name ending in `[]` stands for an indexed family
    /// (`Sequence[]` accepts `Sequence[0]`, `Sequence[1]`, ...).
    pub impulses: SmallVec<[String; 2]>,
}

impl KindInfo {
    /// Declares the impulse inputs and outputs of this kind.
    pub fn impulse_flow(&mut self, methods: &[&str], impulses: &[&str]) -> &mut Self {
        self.methods = methods.iter().map(|name| name.to_string()).collect();
        self.impulses = impulses.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn default_output_name(&self) -> Option<&str> {
        self.default_output
            .and_then(|index| self.outputs.get(index))
            .map(|connector| connector.name.as_str())
    }

    pub fn output(&self, name: &str) -> Option<&Connector> {
        self.outputs.iter().find(|connector| connector.name == name)
    }

    pub fn input(&self, name: &str) -> Option<&Connector> {
        self.inputs.iter().find(|connector| connector.name == name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|method| method == name)
    }

    pub fn has_impulse(&self, name: &str) -> bool {
        self.impulses.iter().any(|impulse| match impulse.strip_suffix("[]") {
            Some(family) => name
                .strip_prefix(family)
                .and_then(|rest| rest.strip_prefix('['))
                .and_then(|rest| rest.strip_suffix(']'))
                .is_some_and(|index| index.parse::<u32>().is_ok()),
            None => impulse == name,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    kinds: HashMap<String, KindInfo>,
}

impl Registry {
    /// An empty registry. See [`Registry::standard`] for the full catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kind under the target namespace. Re-defining a kind replaces it.
    pub fn define(
        &mut self,
        kind: &str,
        inputs: &[Connector],
        outputs: &[Connector],
        default_output: Option<usize>,
    ) -> &mut KindInfo {
        let class_name = qualified(kind);
        let info = KindInfo {
            class_name: class_name.clone(),
            inputs: inputs.iter().cloned().collect(),
            outputs: outputs.iter().cloned().collect(),
            default_output: default_output.filter(|index| *index < outputs.len()),
            methods: SmallVec::new(),
            impulses: SmallVec::new(),
        };
        match self.kinds.entry(class_name) {
            Entry::Occupied(mut entry) => {
                entry.insert(info);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(info),
        }
    }

    /// Literal-style input node: no inputs, a single `*` output.
    pub fn define_input(&mut self, kind: &str, ty: &str) -> &mut KindInfo {
        self.define(kind, &[], &[Connector::new("*", ty)], Some(0))
    }

    /// Two-operand node with inputs `A`, `B` and a single `*` output.
    pub fn define_binary(&mut self, kind: &str, operand: &str, result: &str) -> &mut KindInfo {
        self.define(
            kind,
            &[Connector::new("A", operand), Connector::new("B", operand)],
            &[Connector::new("*", result)],
            Some(0),
        )
    }

    /// Looks a kind up by class name, stripping any generic argument.
    pub fn get(&self, kind: &str) -> Result<&KindInfo> {
        let class_name = qualified(generic_base(kind));
        self.kinds
            .get(&class_name)
            .ok_or(LowerError::UnknownKind(class_name))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.get(kind).is_ok()
    }

    pub fn default_output_of(&self, kind: &str) -> Result<&str> {
        let info = self.get(kind)?;
        info.default_output_name()
            .ok_or_else(|| LowerError::UnknownConnector {
                kind: info.class_name.clone(),
                connector: "<default output>".to_string(),
            })
    }

    /// Type of a named output, with the generic placeholder substituted when
    /// `kind` carries a generic argument.
    pub fn output_type(&self, kind: &str, output: &str) -> Result<String> {
        let info = self.get(kind)?;
        let connector = info.output(output).ok_or_else(|| LowerError::UnknownConnector {
            kind: info.class_name.clone(),
            connector: output.to_string(),
        })?;
        Ok(match generic_argument(kind) {
            Some(argument) if connector.ty == GENERIC_ARGUMENT => argument.to_string(),
            _ => connector.ty.clone(),
        })
    }

    /// All kinds, sorted by class name.
    pub fn kinds(&self) -> Vec<&KindInfo> {
        let mut kinds: Vec<_> = self.kinds.values().collect();
        kinds.sort_by(|a, b| a.class_name.cmp(&b.class_name));
        kinds
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
