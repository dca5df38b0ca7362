//! Lowering of a [`Program`] into a node graph.
//!
//! One [`Lowerer`] context is threaded through the whole depth-first walk: it
//! owns the graph under construction, the scope stack, the execution cursor
//! and the sequencer state. Expression lowering returns the producing node
//! directly instead of collecting operands on a shared stack.

mod checkpoint;
mod expr;
pub mod flow;
mod routine;
mod stmt;

use indexmap::IndexMap;

use crate::ast::{Expression, Item, Program, Span, Spanned};
use crate::catalog;
use crate::config::LoweringConfig;
use crate::error::{Diagnostic, DiagnosticKind, LowerError, Result};
use crate::graph::{Graph, NodeId, Record, SlotId};
use crate::registry::Registry;
use crate::scope::ScopeStack;
use crate::types::TypeTable;

use flow::{Cursor, FlowState};

/// Output of a successful lowering.
#[derive(Debug, Clone)]
pub struct Lowered {
    pub graph: Graph,
    /// Constructs that were skipped, in source order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Lowered {
    pub fn records(&self) -> &[Record] {
        self.graph.records()
    }
}

/// Lowers `program` with the standard catalogue.
pub fn lower_program(program: &Program, config: &LoweringConfig) -> Result<Lowered> {
    lower_program_with(program, config, Registry::standard())
}

/// Lowers `program` against a caller-supplied catalogue.
pub fn lower_program_with(
    program: &Program,
    config: &LoweringConfig,
    registry: Registry,
) -> Result<Lowered> {
    let mut lowerer = Lowerer::new(config, registry);

    // Phase 0: collect every routine signature so calls may precede declarations.
    for item in &program.items {
        if let Item::Routine(routine) = item {
            lowerer.declare_routine(&routine.node)?;
        }
    }

    for item in &program.items {
        if let Item::Routine(routine) = item {
            lowerer.lower_routine(&routine.node)?;
        }
    }

    let statements: Vec<_> = program
        .items
        .iter()
        .filter_map(|item| match item {
            Item::Statement(statement) => Some(statement),
            Item::Routine(_) => None,
        })
        .collect();
    if !statements.is_empty() {
        log::debug!("lowering {} top-level statements", statements.len());
        lowerer.cursor.clear();
        lowerer.graph.layout.forward(config.layout.routine_step);
        lowerer.lower_block(statements)?;
    }

    lowerer.finish()
}

/// Signature of a declared routine, with types already mapped.
#[derive(Debug, Clone)]
pub(crate) struct Routine {
    pub name: String,
    pub slot: SlotId,
    pub parameters: Vec<RoutineParameter>,
    pub returns: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct RoutineParameter {
    pub name: String,
    pub ty: String,
}

pub(crate) struct Lowerer {
    graph: Graph,
    scopes: ScopeStack,
    cursor: Cursor,
    flow: FlowState,
    types: TypeTable,
    routines: IndexMap<String, Routine>,
    /// Name of the routine whose body is being lowered.
    current_routine: Option<String>,
    diagnostics: Vec<Diagnostic>,
}

impl Lowerer {
    fn new(config: &LoweringConfig, registry: Registry) -> Self {
        Self {
            graph: Graph::new(
                registry,
                &config.program_title,
                config.format_version,
                config.layout,
            ),
            scopes: ScopeStack::new(),
            cursor: Cursor::default(),
            flow: FlowState::default(),
            types: config.type_table(),
            routines: IndexMap::new(),
            current_routine: None,
            diagnostics: Vec::new(),
        }
    }

    fn finish(self) -> Result<Lowered> {
        if self.scopes.depth() != 0 {
            return Err(LowerError::MalformedCollectionState(format!(
                "{} scopes left open",
                self.scopes.depth()
            )));
        }
        if self.flow.is_branching() {
            return Err(LowerError::MalformedCollectionState(
                "branch left open".to_string(),
            ));
        }
        log::debug!(
            "lowered {} nodes with {} diagnostics",
            self.graph.node_count(),
            self.diagnostics.len()
        );
        Ok(Lowered {
            graph: self.graph,
            diagnostics: self.diagnostics,
        })
    }

    fn report(&mut self, kind: DiagnosticKind, message: impl Into<String>, span: Span) {
        let diagnostic = Diagnostic::new(kind, message, Some(span));
        log::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    /// Lowers an expression whose value is required. An expression that yields
    /// nothing without having reported why is a [`DiagnosticKind::MissingValue`].
    fn lower_value(&mut self, expression: &Spanned<Expression>, role: &str) -> Result<Option<NodeId>> {
        let reported = self.diagnostics.len();
        let value = self.lower_expression(expression)?;
        if value.is_none() && self.diagnostics.len() == reported {
            self.report(
                DiagnosticKind::MissingValue,
                format!("{role} produces no value"),
                expression.span,
            );
        }
        Ok(value)
    }

    /// String constant node, used for tags and variable names.
    fn string_literal(&mut self, value: &str) -> Result<NodeId> {
        let node = self.graph.add_node(catalog::STRING_INPUT, "Literal String")?;
        self.graph.set_constant(node, value)?;
        Ok(node)
    }
}
