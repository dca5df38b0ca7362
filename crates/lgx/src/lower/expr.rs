use crate::ast::{BinaryOp, Expression, Literal, Span, Spanned};
use crate::catalog;
use crate::error::{DiagnosticKind, Result};
use crate::graph::NodeId;

use super::Lowerer;

impl Lowerer {
    /// Lowers an expression to the node producing its value. `Ok(None)` means
    /// nothing was produced: either a diagnostic was reported, or the
    /// expression has no value (a call to a routine without a return type).
    pub(super) fn lower_expression(
        &mut self,
        expression: &Spanned<Expression>,
    ) -> Result<Option<NodeId>> {
        match &expression.node {
            Expression::Literal(literal) => self.lower_literal(literal, expression.span),
            Expression::Identifier(name) => {
                let producer = self.scopes.resolve(name)?.producer;
                if producer.is_none() {
                    self.report(
                        DiagnosticKind::MissingValue,
                        format!("`{name}` is read before being assigned"),
                        expression.span,
                    );
                }
                Ok(producer)
            }
            Expression::Binary { op, left, right } => {
                self.lower_binary(*op, left, right, expression.span)
            }
            Expression::Call { callee, arguments } => {
                if self.routines.contains_key(callee) {
                    self.lower_routine_call(callee, arguments, expression.span)
                } else if let Some(builtin) = catalog::builtin(callee) {
                    self.lower_builtin(builtin, arguments, expression.span)
                } else {
                    self.report(
                        DiagnosticKind::UnsupportedCall,
                        format!("unsupported function `{callee}`"),
                        expression.span,
                    );
                    Ok(None)
                }
            }
            Expression::New { ty, arguments } => self.lower_new(ty, arguments, expression.span),
        }
    }

    fn lower_literal(&mut self, literal: &Literal, span: Span) -> Result<Option<NodeId>> {
        let Some(kind) = catalog::literal_input(literal) else {
            self.report(
                DiagnosticKind::UnsupportedLiteralType,
                format!("cannot handle {} literals", literal.type_name()),
                span,
            );
            return Ok(None);
        };
        let node = self
            .graph
            .add_node(kind, &format!("Literal {}", literal.type_name()))?;
        self.graph.set_constant(node, literal.constant_text())?;
        Ok(Some(node))
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        left: &Spanned<Expression>,
        right: &Spanned<Expression>,
        span: Span,
    ) -> Result<Option<NodeId>> {
        let Some(kind) = catalog::binary_operator(op) else {
            self.report(
                DiagnosticKind::UnsupportedOperator,
                format!("no node for operator `{op}`"),
                span,
            );
            return Ok(None);
        };
        let left = self.lower_value(left, &format!("left operand of `{op}`"))?;
        let right = self.lower_value(right, &format!("right operand of `{op}`"))?;
        let (Some(left), Some(right)) = (left, right) else {
            return Ok(None);
        };

        self.graph.layout.forward(self.graph.layout.steps.column_step);
        let node = self.graph.add_node(kind, &format!("Operator {op}"))?;
        self.graph.connect_data(node, "A", left, None)?;
        self.graph.connect_data(node, "B", right, None)?;
        Ok(Some(node))
    }

    fn lower_builtin(
        &mut self,
        builtin: &catalog::Builtin,
        arguments: &[Spanned<Expression>],
        span: Span,
    ) -> Result<Option<NodeId>> {
        if arguments.len() != builtin.inputs.len() {
            self.report(
                DiagnosticKind::UnsupportedCall,
                format!(
                    "`{}` takes {} arguments, got {}",
                    builtin.name,
                    builtin.inputs.len(),
                    arguments.len()
                ),
                span,
            );
            return Ok(None);
        }
        let Some(values) = self.lower_arguments(builtin.name, arguments)? else {
            return Ok(None);
        };

        self.graph.layout.forward(self.graph.layout.steps.column_step);
        let node = self.graph.add_node(builtin.kind, builtin.name)?;
        for (input, value) in builtin.inputs.iter().zip(values) {
            self.graph.connect_data(node, input, value, None)?;
        }
        Ok(Some(node))
    }

    /// Lowers call arguments left to right. `None` if any of them has no value.
    pub(super) fn lower_arguments(
        &mut self,
        callee: &str,
        arguments: &[Spanned<Expression>],
    ) -> Result<Option<Vec<NodeId>>> {
        let mut values = Vec::with_capacity(arguments.len());
        let mut complete = true;
        for (index, argument) in arguments.iter().enumerate() {
            match self.lower_value(argument, &format!("argument {} of `{callee}`", index + 1))? {
                Some(value) => values.push(value),
                None => complete = false,
            }
        }
        Ok(complete.then_some(values))
    }

    /// `new Color(r, g, b, a)` with numeric literal components becomes a color
    /// constant. Nothing else can be constructed.
    fn lower_new(
        &mut self,
        ty: &str,
        arguments: &[Spanned<Expression>],
        span: Span,
    ) -> Result<Option<NodeId>> {
        let components: Option<Vec<String>> = arguments
            .iter()
            .map(|argument| match &argument.node {
                Expression::Literal(literal) if literal.as_number().is_some() => {
                    Some(literal.constant_text())
                }
                _ => None,
            })
            .collect();
        match components {
            Some(components) if ty == "Color" && components.len() == 4 => {
                let node = self.graph.add_node(catalog::COLOR_TEXT_INPUT, "new Color")?;
                self.graph
                    .set_constant(node, format!("[{}]", components.join(";")))?;
                Ok(Some(node))
            }
            _ => {
                self.report(
                    DiagnosticKind::UnsupportedConstruct,
                    format!("cannot construct `{ty}` from {} arguments", arguments.len()),
                    span,
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{BinaryOp, Expression, Item, Literal, Program, Spanned, Statement};
    use crate::catalog;
    use crate::config::LoweringConfig;
    use crate::error::DiagnosticKind;
    use crate::lower::{Lowered, lower_program};

    fn lower(statements: Vec<Spanned<Statement>>) -> Lowered {
        let program = Program::new(statements.into_iter().map(Item::Statement).collect());
        lower_program(&program, &LoweringConfig::default()).unwrap()
    }

    fn float(value: f32) -> Spanned<Expression> {
        Expression::literal(Literal::Float(value))
    }

    #[test]
    fn declaration_reuses_initializer_producer() {
        let lowered = lower(vec![
            Statement::declare("float", "a", Some(float(2.5))),
            Statement::declare("float", "b", Some(Expression::ident("a"))),
            Statement::declare(
                "float",
                "c",
                Some(Expression::binary(
                    BinaryOp::Multiply,
                    Expression::ident("a"),
                    Expression::ident("b"),
                )),
            ),
        ]);
        let graph = &lowered.graph;
        let literal = graph.nodes_of_kind("Input.FloatInput")[0];
        let product = graph.nodes_of_kind("Operators.Mul_Float")[0];
        assert_eq!(graph.constant(literal), Some("2.5"));
        assert_eq!(graph.data_source(product, "A"), Some((literal, "*")));
        assert_eq!(graph.data_source(product, "B"), Some((literal, "*")));
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn builtins_take_their_arguments_in_order() {
        let lowered = lower(vec![Statement::declare(
            "Color",
            "tint",
            Some(Expression::call(
                "Color.FromHSV",
                vec![float(0.1), float(0.2), float(0.3)],
            )),
        )]);
        let graph = &lowered.graph;
        let hsv = graph.nodes_of_kind(catalog::HSV_TO_COLOR)[0];
        let inputs = graph.nodes_of_kind("Input.FloatInput");
        for (input, literal) in ["H", "S", "V"].into_iter().zip(inputs) {
            assert_eq!(graph.data_source(hsv, input), Some((literal, "*")));
        }
    }

    #[test]
    fn builtin_arity_is_checked() {
        let lowered = lower(vec![Statement::expr(Expression::call(
            "Color.FromHSV",
            vec![float(0.1)],
        ))]);
        assert_eq!(lowered.diagnostics[0].kind, DiagnosticKind::UnsupportedCall);
        assert_eq!(lowered.graph.node_count(), 0);
    }

    #[test]
    fn color_constant() {
        let lowered = lower(vec![Statement::declare(
            "Color",
            "red",
            Some(Expression::new_object(
                "Color",
                vec![float(1.0), float(0.0), float(0.0), float(0.5)],
            )),
        )]);
        let graph = &lowered.graph;
        let color = graph.nodes_of_kind(catalog::COLOR_TEXT_INPUT)[0];
        assert_eq!(graph.constant(color), Some("[1;0;0;0.5]"));
    }

    #[test]
    fn other_constructions_are_unsupported() {
        let lowered = lower(vec![Statement::expr(Expression::new_object(
            "Vector3",
            vec![float(1.0)],
        ))]);
        assert_eq!(lowered.diagnostics[0].kind, DiagnosticKind::UnsupportedConstruct);
    }

    #[test]
    fn unsupported_literal() {
        let lowered = lower(vec![Statement::declare(
            "object",
            "nothing",
            Some(Expression::literal(Literal::Null)),
        )]);
        assert_eq!(lowered.diagnostics.len(), 1);
        assert_eq!(
            lowered.diagnostics[0].kind,
            DiagnosticKind::UnsupportedLiteralType
        );
    }

    #[test]
    fn unsupported_call_keeps_sibling_nodes() {
        let lowered = lower(vec![Statement::declare(
            "float",
            "x",
            Some(Expression::binary(
                BinaryOp::Add,
                float(1.0),
                Expression::call("Math.Sin", vec![float(0.5)]),
            )),
        )]);
        assert_eq!(lowered.diagnostics.len(), 1);
        assert_eq!(lowered.diagnostics[0].kind, DiagnosticKind::UnsupportedCall);
        assert_eq!(lowered.graph.nodes_of_kind("Input.FloatInput").len(), 1);
        assert!(lowered.graph.nodes_of_kind("Operators.Add_Int").is_empty());
    }
}
