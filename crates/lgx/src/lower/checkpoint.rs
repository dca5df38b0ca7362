//! Branch reconciliation.
//!
//! The target has no phi node, so a variable written inside a branch gets a
//! value register. The pre-branch value is written into it on the checkpoint
//! zone (sequencer output 0, which runs before any arm) and each arm writes
//! its own value on the main cursor. Readers at the defining level then see
//! the register.

use crate::catalog;
use crate::error::Result;
use crate::graph::NodeId;

use super::Lowerer;

impl Lowerer {
    pub(super) fn start_branching(&mut self) -> Result<()> {
        if self.flow.is_branching() {
            self.reconcile_below(self.scopes.depth())?;
        }
        let level = self.scopes.depth();
        self.flow
            .start_branching(&mut self.graph, &mut self.cursor, level)
    }

    pub(super) fn stop_branching(&mut self) -> Result<()> {
        let level = self.scopes.depth();
        self.flow.stop_branching(&mut self.cursor, level)
    }

    /// Reconciles enclosing levels when a scope boundary is crossed inside a
    /// branching construct.
    pub(super) fn save_if_branching(&mut self) -> Result<()> {
        if self.flow.is_branching() {
            self.reconcile_below(self.scopes.depth())?;
        }
        Ok(())
    }

    /// Every dirty binding of levels `1..depth`. Bindings stay dirty after
    /// reconciliation, so later boundaries write them again.
    fn reconcile_below(&mut self, depth: usize) -> Result<()> {
        for level in 1..depth {
            for name in self.scopes.dirty_at(level) {
                self.checkpoint(level, &name)?;
            }
        }
        Ok(())
    }

    fn checkpoint(&mut self, level: usize, name: &str) -> Result<()> {
        let binding = self.scopes.binding_at_mut(level, name)?.clone();
        let register = match binding.register {
            Some(register) => register,
            None => {
                let register = self.graph.add_node(
                    &catalog::generic(catalog::VALUE_REGISTER, &binding.ty),
                    &format!("Saving {name}"),
                )?;
                log::debug!("register {register} materialized for `{name}` (level {level})");
                register
            }
        };

        if let Some(source) = binding.checkpoint_source.filter(|source| *source != register) {
            let write = self.register_write(register, &binding.ty, source)?;
            match self.flow.zone_for(level) {
                Some(zone) => {
                    self.graph
                        .connect_impulse(write, "Write", zone.node, &zone.impulse)?;
                    zone.node = write;
                    zone.impulse = "OnDone".to_string();
                }
                // Nothing diverges at or below `level`, so the capture runs
                // unconditionally on the main path.
                None => self.cursor.chain(&mut self.graph, write, "Write", "OnDone")?,
            }
        }

        if let Some(producer) = binding.producer {
            let write = self.register_write(register, &binding.ty, producer)?;
            self.cursor.chain(&mut self.graph, write, "Write", "OnDone")?;
        }

        let binding = self.scopes.binding_at_mut(level, name)?;
        binding.register = Some(register);
        binding.producer = Some(register);
        binding.checkpoint_source = Some(register);
        Ok(())
    }

    fn register_write(&mut self, register: NodeId, ty: &str, value: NodeId) -> Result<NodeId> {
        let write = self
            .graph
            .add_node(&catalog::generic(catalog::WRITE_VALUE, ty), "Register write")?;
        self.graph.connect_data(write, "Value", value, None)?;
        self.graph.write_target(register, write)?;
        Ok(write)
    }

    /// Pops the innermost scope, reconciling first when branching.
    pub(super) fn leave_scope(&mut self) -> Result<()> {
        self.save_if_branching()?;
        self.scopes.pop()?;
        self.flow.retire_above(self.scopes.depth())
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{BinaryOp, Expression, Item, Literal, Program, RoutineDecl, Spanned, Statement};
    use crate::catalog;
    use crate::config::LoweringConfig;
    use crate::lower::lower_program;

    fn float(value: f32) -> Spanned<Expression> {
        Expression::literal(Literal::Float(value))
    }

    fn routine(body: Vec<Spanned<Statement>>) -> Program {
        Program::new(vec![Item::Routine(Spanned::new(RoutineDecl::new(
            "Tick",
            &[("flag", "bool")],
            None,
            body,
        )))])
    }

    #[test]
    fn no_register_without_branching() {
        let program = routine(vec![
            Statement::declare("float", "x", Some(float(1.0))),
            Statement::assign("x", float(2.0)),
        ]);
        let lowered = lower_program(&program, &LoweringConfig::default()).unwrap();
        assert!(lowered.graph.nodes_of_kind(catalog::VALUE_REGISTER).is_empty());
    }

    #[test]
    fn each_arm_writes_on_its_own_path() {
        let program = routine(vec![
            Statement::declare("float", "x", Some(float(1.0))),
            Statement::conditional(
                Expression::ident("flag"),
                Statement::block(vec![Statement::assign("x", float(2.0))]),
                Some(Statement::assign("x", float(3.0))),
            ),
            Statement::declare("float", "y", Some(Expression::ident("x"))),
        ]);
        let lowered = lower_program(&program, &LoweringConfig::default()).unwrap();
        let graph = &lowered.graph;
        let registers = graph.nodes_of_kind(catalog::VALUE_REGISTER);
        assert_eq!(registers.len(), 1);
        let writers = graph.writers_of(registers[0]);
        // Zone capture, then the `then` and `else` arm writes.
        assert_eq!(writers.len(), 3);
        let branch = graph.nodes_of_kind(catalog::IF)[0];
        let else_entry = graph
            .impulse_wires()
            .find(|(_, _, source, impulse)| *source == branch && *impulse == "False")
            .map(|(destination, ..)| destination);
        assert_eq!(else_entry, Some(writers[2]));
    }

    #[test]
    fn nested_branch_captures_outer_write_first() {
        let program = routine(vec![
            Statement::declare("float", "x", Some(float(1.0))),
            Statement::conditional(
                Expression::ident("flag"),
                Statement::block(vec![
                    Statement::assign("x", float(2.0)),
                    Statement::conditional(
                        Expression::binary(BinaryOp::GreaterThan, Expression::ident("x"), float(0.0)),
                        Statement::block(vec![]),
                        None,
                    ),
                ]),
                None,
            ),
        ]);
        let lowered = lower_program(&program, &LoweringConfig::default()).unwrap();
        let graph = &lowered.graph;
        let register = graph.nodes_of_kind(catalog::VALUE_REGISTER)[0];
        let comparison = graph.nodes_of_kind("Operators.GreaterThan_Float")[0];
        assert_eq!(graph.data_source(comparison, "A"), Some((register, "*")));
    }

    #[test]
    fn local_of_an_arm_written_from_a_nested_block() {
        let program = routine(vec![Statement::conditional(
            Expression::ident("flag"),
            Statement::block(vec![
                Statement::declare("float", "y", Some(float(1.0))),
                Statement::block(vec![Statement::assign("y", float(2.0))]),
            ]),
            None,
        )]);
        let lowered = lower_program(&program, &LoweringConfig::default()).unwrap();
        assert!(lowered.diagnostics.is_empty());
        let graph = &lowered.graph;
        let register = graph.nodes_of_kind(catalog::VALUE_REGISTER)[0];
        let writers = graph.writers_of(register);
        let one = graph
            .nodes_of_kind("Input.FloatInput")
            .into_iter()
            .find(|node| graph.constant(*node) == Some("1"))
            .unwrap();
        // The capture of `1` runs inside the `then` arm, after the conditional.
        assert_eq!(graph.data_source(writers[0], "Value"), Some((one, "*")));
        let branch = graph.nodes_of_kind(catalog::IF)[0];
        let entry = graph
            .impulse_wires()
            .find(|(_, _, source, impulse)| *source == branch && *impulse == "True")
            .map(|(destination, ..)| destination);
        assert_eq!(entry, Some(writers[0]));
    }
}
