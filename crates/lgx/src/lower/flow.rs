//! Impulse threading: the execution cursor, per-level sequencers and the
//! checkpoint zones hanging off their reserved first output.

use crate::catalog;
use crate::error::{LowerError, Result};
use crate::graph::{Graph, NodeId};

/// A node's named impulse output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpulsePoint {
    pub node: NodeId,
    pub impulse: String,
}

impl ImpulsePoint {
    pub fn new(node: NodeId, impulse: impl Into<String>) -> Self {
        Self {
            node,
            impulse: impulse.into(),
        }
    }
}

/// Where execution currently is. Invalid until seeded at a routine entry.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    at: Option<ImpulsePoint>,
}

impl Cursor {
    pub fn is_valid(&self) -> bool {
        self.at.is_some()
    }

    pub fn current(&self) -> Option<&ImpulsePoint> {
        self.at.as_ref()
    }

    pub fn advance(&mut self, node: NodeId, impulse: impl Into<String>) {
        self.at = Some(ImpulsePoint::new(node, impulse));
    }

    pub fn clear(&mut self) {
        self.at = None;
    }

    /// Wires the cursor into `destination.method` and moves it to
    /// `destination.next`. No-op while the cursor is invalid.
    pub fn chain(
        &mut self,
        graph: &mut Graph,
        destination: NodeId,
        method: &str,
        next: &str,
    ) -> Result<()> {
        let Some(at) = &self.at else {
            return Ok(());
        };
        graph.connect_impulse(destination, method, at.node, &at.impulse)?;
        self.advance(destination, next);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub node: NodeId,
    /// Last output handed out. Output 0 belongs to the checkpoint zone.
    current_output: usize,
    users: usize,
}

impl Sequence {
    fn new(node: NodeId) -> Self {
        Self {
            node,
            current_output: 0,
            users: 0,
        }
    }

    fn next_output(&mut self) -> String {
        self.current_output += 1;
        catalog::sequence_output(self.current_output)
    }
}

/// Sequencers and checkpoint zones, indexed by scope level.
#[derive(Debug, Clone, Default)]
pub struct FlowState {
    sequences: Vec<Option<Sequence>>,
    zones: Vec<Option<ImpulsePoint>>,
    branching: usize,
}

impl FlowState {
    pub fn is_branching(&self) -> bool {
        self.branching > 0
    }

    pub fn sequence_at(&self, level: usize) -> Option<&Sequence> {
        self.sequences.get(level).and_then(Option::as_ref)
    }

    fn ensure_level(&mut self, level: usize) {
        if self.sequences.len() <= level {
            self.sequences.resize(level + 1, None);
        }
        if self.zones.len() <= level {
            self.zones.resize(level + 1, None);
        }
    }

    /// Opens a branch path at `level`. A new sequencer is triggered from the
    /// cursor and its zone prepared at output 0; the cursor then moves to the
    /// next free output.
    pub fn start_branching(
        &mut self,
        graph: &mut Graph,
        cursor: &mut Cursor,
        level: usize,
    ) -> Result<()> {
        self.ensure_level(level);
        if self.sequences[level].is_none() {
            let node = graph.add_node(catalog::SEQUENCE, "Branching")?;
            if let Some(at) = cursor.current() {
                graph.connect_impulse(node, "Trigger", at.node, &at.impulse)?;
            }
            self.sequences[level] = Some(Sequence::new(node));
            self.zones[level] = Some(ImpulsePoint::new(node, catalog::sequence_output(0)));
            log::debug!("sequencer {node} opened at level {level}");
        }
        let sequence = self.sequences[level].as_mut().ok_or_else(|| {
            LowerError::MalformedCollectionState(format!("no sequence at level {level}"))
        })?;
        cursor.advance(sequence.node, sequence.next_output());
        sequence.users += 1;
        self.branching += 1;
        Ok(())
    }

    /// Closes a branch path: the cursor continues from the sequencer's next
    /// output. The last user retires the sequence together with its zone.
    pub fn stop_branching(&mut self, cursor: &mut Cursor, level: usize) -> Result<()> {
        let sequence = self
            .sequences
            .get_mut(level)
            .and_then(Option::as_mut)
            .ok_or_else(|| {
                LowerError::MalformedCollectionState(format!(
                    "branch closed at level {level} without an open sequence"
                ))
            })?;
        cursor.advance(sequence.node, sequence.next_output());
        sequence.users -= 1;
        if sequence.users == 0 {
            log::debug!("sequencer {} retired at level {level}", sequence.node);
            self.sequences[level] = None;
            self.zones[level] = None;
        }
        self.branching = self.branching.saturating_sub(1);
        Ok(())
    }

    /// Zone serving bindings defined at `level`: its own, else the nearest
    /// active one deeper in the stack. `None` when nothing branches at or
    /// below `level`.
    pub fn zone_for(&mut self, level: usize) -> Option<&mut ImpulsePoint> {
        self.zones.iter_mut().skip(level).find_map(Option::as_mut)
    }

    /// Drops sequencers and zones deeper than `depth` once their scope is gone.
    pub fn retire_above(&mut self, depth: usize) -> Result<()> {
        if let Some(open) = self
            .sequences
            .iter()
            .skip(depth + 1)
            .flatten()
            .find(|sequence| sequence.users > 0)
        {
            return Err(LowerError::MalformedCollectionState(format!(
                "scope closed while sequencer {} is still in use",
                open.node
            )));
        }
        self.sequences.truncate(depth + 1);
        self.zones.truncate(depth + 1);
        Ok(())
    }
}
