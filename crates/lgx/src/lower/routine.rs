//! Routines without a stack.
//!
//! Each routine owns a slot. Parameters and the return value are dynamic
//! variables stored on that slot; a call writes the arguments, then fires a
//! trigger tagged with the routine's name at the slot, where the routine's
//! receiver picks it up. Nested invocations of the same routine would share
//! the storage, so recursion is rejected.

use crate::ast::{Expression, RoutineDecl, Span, Spanned, Statement};
use crate::catalog;
use crate::error::{DiagnosticKind, LowerError, Result};
use crate::graph::{NodeId, SlotId};

use super::{Lowerer, Routine, RoutineParameter};

const RETURN_VARIABLE: &str = "return";

impl Lowerer {
    /// Registers a routine signature and allocates its slot.
    pub(super) fn declare_routine(&mut self, declaration: &RoutineDecl) -> Result<()> {
        if self.routines.contains_key(&declaration.name) {
            return Err(LowerError::DuplicateDeclaration(declaration.name.clone()));
        }
        let parameters = declaration
            .parameters
            .iter()
            .map(|parameter| {
                Ok(RoutineParameter {
                    name: parameter.name.clone(),
                    ty: self.types.target(&parameter.ty)?.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let returns = declaration
            .returns()
            .map(|ty| self.types.target(ty).map(str::to_string))
            .transpose()?;
        let slot = self.graph.add_slot(&declaration.name);
        self.routines.insert(
            declaration.name.clone(),
            Routine {
                name: declaration.name.clone(),
                slot,
                parameters,
                returns,
            },
        );
        Ok(())
    }

    pub(super) fn lower_routine(&mut self, declaration: &RoutineDecl) -> Result<()> {
        let routine = self
            .routines
            .get(&declaration.name)
            .cloned()
            .ok_or_else(|| LowerError::UnknownIdentifier(declaration.name.clone()))?;
        log::debug!(
            "routine `{}` ({} parameters, returns {:?})",
            routine.name,
            routine.parameters.len(),
            routine.returns
        );

        self.graph.layout.forward(self.graph.layout.steps.routine_step);
        for parameter in &routine.parameters {
            self.graph
                .declare_variable(routine.slot, &parameter.name, &parameter.ty);
            let read = self.dynamic_read(
                &parameter.ty,
                &parameter.name,
                &format!("Param : {}", parameter.name),
                routine.slot,
            )?;
            self.scopes.stage_parameter(&parameter.name, &parameter.ty, read)?;
        }
        if !routine.parameters.is_empty() {
            self.graph.layout.forward(self.graph.layout.steps.parameter_step);
        }

        let receiver = self
            .graph
            .add_node(catalog::IMPULSE_RECEIVER, &routine.name)?;
        let tag = self.string_literal(&routine.name)?;
        self.graph.connect_data(receiver, "Tag", tag, None)?;
        if let Some(returns) = &routine.returns {
            self.graph
                .declare_variable(routine.slot, RETURN_VARIABLE, returns);
        }

        self.cursor.advance(receiver, "Impulse");
        self.current_routine = Some(routine.name.clone());
        self.lower_block(&declaration.body)?;
        self.current_routine = None;
        self.cursor.clear();
        Ok(())
    }

    pub(super) fn lower_return(
        &mut self,
        statement: &Spanned<Statement>,
        value: Option<&Spanned<Expression>>,
    ) -> Result<()> {
        let Some(routine) = self
            .current_routine
            .as_ref()
            .and_then(|name| self.routines.get(name))
            .cloned()
        else {
            self.report(
                DiagnosticKind::UnsupportedConstruct,
                "`return` outside of a routine",
                statement.span,
            );
            return Ok(());
        };

        match (value, &routine.returns) {
            (None, None) => Ok(()),
            (Some(_), None) => {
                self.report(
                    DiagnosticKind::UnsupportedConstruct,
                    format!("`{}` has no return type but returns a value", routine.name),
                    statement.span,
                );
                Ok(())
            }
            (None, Some(_)) => {
                self.report(
                    DiagnosticKind::MissingValue,
                    format!("`{}` must return a value", routine.name),
                    statement.span,
                );
                Ok(())
            }
            (Some(value), Some(returns)) => {
                let Some(value) = self.lower_value(value, "returned expression")? else {
                    return Ok(());
                };
                let write = self.dynamic_write(
                    returns,
                    RETURN_VARIABLE,
                    &format!("{} Return", routine.name),
                    routine.slot,
                )?;
                self.graph.connect_data(write, "Value", value, None)?;
                self.cursor.chain(&mut self.graph, write, "Write", "OnSuccess")
            }
        }
    }

    pub(super) fn lower_routine_call(
        &mut self,
        callee: &str,
        arguments: &[Spanned<Expression>],
        span: Span,
    ) -> Result<Option<NodeId>> {
        let routine = self
            .routines
            .get(callee)
            .cloned()
            .ok_or_else(|| LowerError::UnknownIdentifier(callee.to_string()))?;
        if self.current_routine.as_deref() == Some(callee) {
            self.report(
                DiagnosticKind::UnsupportedCall,
                format!("recursive call to `{callee}`"),
                span,
            );
            return Ok(None);
        }
        if arguments.len() != routine.parameters.len() {
            self.report(
                DiagnosticKind::UnsupportedCall,
                format!(
                    "`{callee}` takes {} arguments, got {}",
                    routine.parameters.len(),
                    arguments.len()
                ),
                span,
            );
            return Ok(None);
        }
        let Some(values) = self.lower_arguments(callee, arguments)? else {
            return Ok(None);
        };
        log::debug!("call `{callee}` with {} arguments", values.len());

        for (parameter, value) in routine.parameters.iter().zip(values) {
            let write = self.dynamic_write(
                &parameter.ty,
                &parameter.name,
                &format!("SetArg {}", parameter.name),
                routine.slot,
            )?;
            self.graph.connect_data(write, "Value", value, None)?;
            self.cursor.chain(&mut self.graph, write, "Write", "OnSuccess")?;
        }

        let trigger = self
            .graph
            .add_node(catalog::IMPULSE_TRIGGER, &format!("Calling {callee}"))?;
        self.graph
            .bind_slot(trigger, "TargetHierarchy", routine.slot)?;
        let tag = self.string_literal(callee)?;
        self.graph.connect_data(trigger, "Tag", tag, None)?;
        self.cursor
            .chain(&mut self.graph, trigger, "Run", "OnTriggered")?;

        match &routine.returns {
            Some(returns) => self
                .dynamic_read(
                    returns,
                    RETURN_VARIABLE,
                    &format!("Read {callee} return"),
                    routine.slot,
                )
                .map(Some),
            None => Ok(None),
        }
    }

    fn dynamic_read(&mut self, ty: &str, variable: &str, label: &str, slot: SlotId) -> Result<NodeId> {
        let node = self
            .graph
            .add_node(&catalog::generic(catalog::READ_DYNAMIC_VARIABLE, ty), label)?;
        let name = self.string_literal(variable)?;
        self.graph.connect_data(node, "VariableName", name, None)?;
        self.graph.bind_slot(node, "Source", slot)?;
        Ok(node)
    }

    fn dynamic_write(&mut self, ty: &str, variable: &str, label: &str, slot: SlotId) -> Result<NodeId> {
        let node = self
            .graph
            .add_node(&catalog::generic(catalog::WRITE_DYNAMIC_VARIABLE, ty), label)?;
        let name = self.string_literal(variable)?;
        self.graph.connect_data(node, "VariableName", name, None)?;
        self.graph.bind_slot(node, "Target", slot)?;
        Ok(node)
    }
}
