use crate::ast::{AssignOp, Expression, Spanned, Statement};
use crate::catalog;
use crate::error::{DiagnosticKind, Result};

use super::Lowerer;

impl Lowerer {
    /// A block: reconcile, open a scope, lower the statements, reconcile, close.
    pub(super) fn lower_block<'s>(
        &mut self,
        statements: impl IntoIterator<Item = &'s Spanned<Statement>>,
    ) -> Result<()> {
        self.save_if_branching()?;
        self.scopes.push();
        for statement in statements {
            self.lower_statement(statement)?;
        }
        self.leave_scope()
    }

    /// Conditional arms always get their own scope, braced or not.
    fn lower_arm(&mut self, arm: &Spanned<Statement>) -> Result<()> {
        match &arm.node {
            Statement::Block(statements) => self.lower_block(statements),
            _ => self.lower_block(std::iter::once(arm)),
        }
    }

    pub(super) fn lower_statement(&mut self, statement: &Spanned<Statement>) -> Result<()> {
        match &statement.node {
            Statement::Block(statements) => self.lower_block(statements),
            Statement::Declaration { ty, declarators } => {
                let ty = self.types.target(ty)?.to_string();
                for declarator in declarators {
                    let producer = match &declarator.initializer {
                        Some(initializer) => self.lower_value(
                            initializer,
                            &format!("initializer of `{}`", declarator.name),
                        )?,
                        None => None,
                    };
                    self.scopes.declare(&declarator.name, &ty, producer)?;
                }
                Ok(())
            }
            Statement::Assignment { target, op, value } => {
                self.lower_assignment(statement, target, *op, value)
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => self.lower_if(condition, then_branch, else_branch.as_deref()),
            Statement::Return(value) => self.lower_return(statement, value.as_ref()),
            Statement::Expression(expression) => {
                self.lower_expression(expression)?;
                Ok(())
            }
        }
    }

    fn lower_assignment(
        &mut self,
        statement: &Spanned<Statement>,
        target: &str,
        op: AssignOp,
        value: &Spanned<Expression>,
    ) -> Result<()> {
        let current = self.scopes.resolve(target)?.producer;
        let operator = match op {
            AssignOp::Assign => None,
            _ => match op.binary() {
                Some(binary) => match catalog::binary_operator(binary) {
                    Some(kind) => Some((binary, kind)),
                    None => {
                        self.report(
                            DiagnosticKind::UnsupportedOperator,
                            format!("no node for `{binary}=`"),
                            statement.span,
                        );
                        return Ok(());
                    }
                },
                None => {
                    self.report(
                        DiagnosticKind::UnsupportedOperator,
                        format!("unsupported assignment operator {op:?}"),
                        statement.span,
                    );
                    return Ok(());
                }
            },
        };

        let Some(value) = self.lower_value(value, &format!("value assigned to `{target}`"))? else {
            return Ok(());
        };

        let producer = match operator {
            None => value,
            Some((binary, kind)) => {
                let Some(current) = current else {
                    self.report(
                        DiagnosticKind::MissingValue,
                        format!("`{target}` is read before being assigned"),
                        statement.span,
                    );
                    return Ok(());
                };
                self.graph.layout.forward(self.graph.layout.steps.column_step);
                let node = self.graph.add_node(kind, &format!("Operator {binary}="))?;
                self.graph.connect_data(node, "A", current, None)?;
                self.graph.connect_data(node, "B", value, None)?;
                node
            }
        };
        self.scopes.write(target, producer)
    }

    fn lower_if(
        &mut self,
        condition: &Spanned<Expression>,
        then_branch: &Spanned<Statement>,
        else_branch: Option<&Spanned<Statement>>,
    ) -> Result<()> {
        log::debug!("branch at level {}", self.scopes.depth());
        self.start_branching()?;

        let Some(condition) = self.lower_value(condition, "condition")? else {
            return self.stop_branching();
        };
        let branch = self.graph.add_node(catalog::IF, "IF Statement")?;
        self.graph.connect_data(branch, "Condition", condition, None)?;
        self.cursor.chain(&mut self.graph, branch, "Run", "True")?;

        self.lower_arm(then_branch)?;
        if let Some(else_branch) = else_branch {
            self.cursor.advance(branch, "False");
            self.lower_arm(else_branch)?;
        }

        self.stop_branching()
    }
}
