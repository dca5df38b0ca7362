//! Append-only graph under construction.
//!
//! Every mutation is validated against the [`Registry`] and recorded as a
//! [`Record`]; the ordered record list is the lowering's output. Nodes and
//! slots are never removed, so a handle stays valid for the whole lowering.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::error::{LowerError, Result};
use crate::registry::{Registry, generic_base, qualified};

/// Arena index of an emitted node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a declared slot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct SlotId(pub u32);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// One graph mutation, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum Record {
    DeclareProgram {
        title: String,
        version: u32,
    },
    DeclareSlot {
        slot: SlotId,
        name: String,
    },
    DeclareNode {
        node: NodeId,
        kind: String,
        label: String,
    },
    SetLayout {
        node: NodeId,
        x: i32,
        y: i32,
    },
    SetConstant {
        node: NodeId,
        value: String,
    },
    ConnectData {
        consumer: NodeId,
        input: String,
        producer: NodeId,
        output: String,
    },
    ConnectImpulse {
        destination: NodeId,
        method: String,
        source: NodeId,
        impulse: String,
    },
    DeclareVariable {
        slot: SlotId,
        name: String,
        #[serde(rename = "type")]
        ty: String,
    },
    BindNodeToSlot {
        node: NodeId,
        input: String,
        slot: SlotId,
    },
    /// Associates a register write node with the register it stores into.
    WriteTarget {
        register: NodeId,
        writer: NodeId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: String,
    pub label: String,
}

/// Column/row cursor for node placement. Purely cosmetic.
#[derive(Debug, Clone)]
pub struct Layout {
    pub steps: LayoutConfig,
    x: i32,
    y: i32,
}

impl Layout {
    pub fn new(steps: LayoutConfig) -> Self {
        Self { steps, x: 0, y: 0 }
    }

    /// Position for the next node, then move one row down.
    fn place(&mut self) -> (i32, i32) {
        let position = (self.x, self.y);
        self.y += self.steps.row_step;
        position
    }

    /// Starts a new column `step` units to the right.
    pub fn forward(&mut self, step: i32) {
        self.x += step;
        self.y = 0;
    }
}

#[derive(Debug, Clone)]
pub struct Graph {
    registry: Registry,
    nodes: Vec<Node>,
    slots: Vec<String>,
    records: Vec<Record>,
    /// (consumer, input) → (producer, output). Re-connecting replaces.
    data_inputs: HashMap<(NodeId, String), (NodeId, String)>,
    pub layout: Layout,
}

impl Graph {
    pub fn new(registry: Registry, title: &str, version: u32, layout: LayoutConfig) -> Self {
        let mut graph = Self {
            registry,
            nodes: Vec::new(),
            slots: Vec::new(),
            records: Vec::new(),
            data_inputs: HashMap::new(),
            layout: Layout::new(layout),
        };
        graph.emit(Record::DeclareProgram {
            title: title.to_string(),
            version,
        });
        graph
    }

    fn emit(&mut self, record: Record) {
        log::trace!("{record:?}");
        self.records.push(record);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    /// Allocates a node of a registered kind. `kind` may be short
    /// (`Input.IntInput`) or already qualified, and may carry a generic argument.
    pub fn add_node(&mut self, kind: &str, label: &str) -> Result<NodeId> {
        self.registry.get(kind)?;
        let node = NodeId(self.nodes.len() as u32);
        let kind = qualified(kind);
        self.nodes.push(Node {
            kind: kind.clone(),
            label: label.to_string(),
        });
        self.emit(Record::DeclareNode {
            node,
            kind,
            label: label.to_string(),
        });
        let (x, y) = self.layout.place();
        self.emit(Record::SetLayout { node, x, y });
        Ok(node)
    }

    pub fn add_slot(&mut self, name: &str) -> SlotId {
        let slot = SlotId(self.slots.len() as u32);
        self.slots.push(name.to_string());
        self.emit(Record::DeclareSlot {
            slot,
            name: name.to_string(),
        });
        slot
    }

    pub fn kind_of(&self, node: NodeId) -> Result<&str> {
        self.nodes
            .get(node.0 as usize)
            .map(|node| node.kind.as_str())
            .ok_or_else(|| {
                LowerError::MalformedCollectionState(format!(
                    "node handle {node} was never allocated"
                ))
            })
    }

    fn check_input(&self, node: NodeId, input: &str) -> Result<()> {
        let info = self.registry.get(self.kind_of(node)?)?;
        match info.input(input) {
            Some(_) => Ok(()),
            None => Err(LowerError::UnknownConnector {
                kind: info.class_name.clone(),
                connector: input.to_string(),
            }),
        }
    }

    /// Wires `producer.output` into `consumer.input`; `None` selects the
    /// producer's default output.
    pub fn connect_data(
        &mut self,
        consumer: NodeId,
        input: &str,
        producer: NodeId,
        output: Option<&str>,
    ) -> Result<()> {
        self.check_input(consumer, input)?;
        let producer_kind = self.kind_of(producer)?;
        let output = match output {
            Some(output) => {
                let info = self.registry.get(producer_kind)?;
                if info.output(output).is_none() {
                    return Err(LowerError::UnknownConnector {
                        kind: info.class_name.clone(),
                        connector: output.to_string(),
                    });
                }
                output.to_string()
            }
            None => self.registry.default_output_of(producer_kind)?.to_string(),
        };
        self.data_inputs.insert(
            (consumer, input.to_string()),
            (producer, output.clone()),
        );
        self.emit(Record::ConnectData {
            consumer,
            input: input.to_string(),
            producer,
            output,
        });
        Ok(())
    }

    /// Emits an impulse wire unconditionally.
    pub fn connect_impulse(
        &mut self,
        destination: NodeId,
        method: &str,
        source: NodeId,
        impulse: &str,
    ) -> Result<()> {
        let destination_info = self.registry.get(self.kind_of(destination)?)?;
        if !destination_info.has_method(method) {
            return Err(LowerError::UnknownConnector {
                kind: destination_info.class_name.clone(),
                connector: method.to_string(),
            });
        }
        let source_info = self.registry.get(self.kind_of(source)?)?;
        if !source_info.has_impulse(impulse) {
            return Err(LowerError::UnknownConnector {
                kind: source_info.class_name.clone(),
                connector: impulse.to_string(),
            });
        }
        self.emit(Record::ConnectImpulse {
            destination,
            method: method.to_string(),
            source,
            impulse: impulse.to_string(),
        });
        Ok(())
    }

    pub fn set_constant(&mut self, node: NodeId, value: impl Into<String>) -> Result<()> {
        self.kind_of(node)?;
        self.emit(Record::SetConstant {
            node,
            value: value.into(),
        });
        Ok(())
    }

    pub fn declare_variable(&mut self, slot: SlotId, name: &str, ty: &str) {
        self.emit(Record::DeclareVariable {
            slot,
            name: name.to_string(),
            ty: ty.to_string(),
        });
    }

    pub fn bind_slot(&mut self, node: NodeId, input: &str, slot: SlotId) -> Result<()> {
        self.check_input(node, input)?;
        self.emit(Record::BindNodeToSlot {
            node,
            input: input.to_string(),
            slot,
        });
        Ok(())
    }

    pub fn write_target(&mut self, register: NodeId, writer: NodeId) -> Result<()> {
        self.kind_of(register)?;
        self.kind_of(writer)?;
        self.emit(Record::WriteTarget { register, writer });
        Ok(())
    }

    // Queries

    /// Producer currently wired into `consumer.input`.
    pub fn data_source(&self, consumer: NodeId, input: &str) -> Option<(NodeId, &str)> {
        self.data_inputs
            .get(&(consumer, input.to_string()))
            .map(|(producer, output)| (*producer, output.as_str()))
    }

    /// Every node of `kind`, ignoring generic arguments.
    pub fn nodes_of_kind(&self, kind: &str) -> Vec<NodeId> {
        let wanted = qualified(generic_base(kind));
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| generic_base(&node.kind) == wanted)
            .map(|(index, _)| NodeId(index as u32))
            .collect()
    }

    pub fn impulse_wires(&self) -> impl Iterator<Item = (NodeId, &str, NodeId, &str)> {
        self.records.iter().filter_map(|record| match record {
            Record::ConnectImpulse {
                destination,
                method,
                source,
                impulse,
            } => Some((*destination, method.as_str(), *source, impulse.as_str())),
            _ => None,
        })
    }

    /// Write nodes targeting `register`, in emission order.
    pub fn writers_of(&self, register: NodeId) -> Vec<NodeId> {
        self.records
            .iter()
            .filter_map(|record| match record {
                Record::WriteTarget {
                    register: target,
                    writer,
                } if *target == register => Some(*writer),
                _ => None,
            })
            .collect()
    }

    /// Last constant set on `node`.
    pub fn constant(&self, node: NodeId) -> Option<&str> {
        self.records.iter().rev().find_map(|record| match record {
            Record::SetConstant { node: target, value } if *target == node => {
                Some(value.as_str())
            }
            _ => None,
        })
    }

    /// Slot bound to `node.input`, if any.
    pub fn slot_binding(&self, node: NodeId, input: &str) -> Option<SlotId> {
        self.records.iter().rev().find_map(|record| match record {
            Record::BindNodeToSlot {
                node: target,
                input: bound,
                slot,
            } if *target == node && bound == input => Some(*slot),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn graph() -> Graph {
        Graph::new(
            Registry::standard(),
            "Test program",
            2,
            LayoutConfig::default(),
        )
    }

    #[test]
    fn handles_are_monotonic() {
        let mut graph = graph();
        let a = graph.add_node("Input.FloatInput", "Literal Single").unwrap();
        let b = graph.add_node("Input.FloatInput", "Literal Single").unwrap();
        assert_eq!((a, b), (NodeId(0), NodeId(1)));
        assert_eq!(
            graph.kind_of(b).unwrap(),
            "FrooxEngine.LogiX.Input.FloatInput"
        );
        assert_eq!(
            graph.records()[..3],
            [
                Record::DeclareProgram {
                    title: "Test program".into(),
                    version: 2
                },
                Record::DeclareNode {
                    node: a,
                    kind: "FrooxEngine.LogiX.Input.FloatInput".into(),
                    label: "Literal Single".into(),
                },
                Record::SetLayout { node: a, x: 0, y: 0 },
            ]
        );
    }

    #[test]
    fn unknown_kind_is_not_allocated() {
        let mut graph = graph();
        assert!(matches!(
            graph.add_node("Operators.Mod_Int", "%"),
            Err(LowerError::UnknownKind(_))
        ));
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn default_output_is_resolved() {
        let mut graph = graph();
        let value = graph.add_node("Input.FloatInput", "value").unwrap();
        let register = graph
            .add_node(&catalog::generic(catalog::WRITE_VALUE, "System.Single"), "write")
            .unwrap();
        graph.connect_data(register, "Value", value, None).unwrap();
        assert_eq!(graph.data_source(register, "Value"), Some((value, "*")));
    }

    #[test]
    fn last_data_write_wins() {
        let mut graph = graph();
        let first = graph.add_node("Input.FloatInput", "a").unwrap();
        let second = graph.add_node("Input.FloatInput", "b").unwrap();
        let add = graph.add_node("Operators.Add_Float", "+").unwrap();
        graph.connect_data(add, "A", first, None).unwrap();
        graph.connect_data(add, "A", second, None).unwrap();
        assert_eq!(graph.data_source(add, "A"), Some((second, "*")));
    }

    #[test]
    fn connectors_are_validated() {
        let mut graph = graph();
        let value = graph.add_node("Input.BoolInput", "cond").unwrap();
        let branch = graph.add_node(catalog::IF, "IF Statement").unwrap();
        assert!(matches!(
            graph.connect_data(branch, "Predicate", value, None),
            Err(LowerError::UnknownConnector { .. })
        ));
        assert!(matches!(
            graph.connect_impulse(branch, "Run", value, "OnDone"),
            Err(LowerError::UnknownConnector { .. })
        ));
        let sequence = graph.add_node(catalog::SEQUENCE, "Branching").unwrap();
        graph
            .connect_impulse(branch, "Run", sequence, &catalog::sequence_output(1))
            .unwrap();
        assert_eq!(graph.impulse_wires().count(), 1);
    }

    #[test]
    fn layout_moves_down_then_forward() {
        let mut graph = graph();
        graph.add_node("Input.IntInput", "a").unwrap();
        graph.add_node("Input.IntInput", "b").unwrap();
        graph.layout.forward(150);
        graph.add_node("Input.IntInput", "c").unwrap();
        let positions: Vec<_> = graph
            .records()
            .iter()
            .filter_map(|record| match record {
                Record::SetLayout { x, y, .. } => Some((*x, *y)),
                _ => None,
            })
            .collect();
        assert_eq!(positions, [(0, 0), (0, 75), (150, 0)]);
    }

    #[test]
    fn records_serialize_with_tags() {
        let mut graph = graph();
        let slot = graph.add_slot("Tick");
        graph.declare_variable(slot, "speed", "System.Single");
        let json = serde_json::to_value(graph.records()).unwrap();
        assert_eq!(json[1]["record"], "declare_slot");
        assert_eq!(json[2]["type"], "System.Single");
        assert_eq!(json[2]["slot"], 0);
    }
}
