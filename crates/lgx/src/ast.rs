//! Source program consumed by the lowering.
//!
//! Parsing is done elsewhere; the front end hands over this closed tree
//! (usually as JSON). Every node carries an optional [`Span`] so diagnostics
//! can point back into the source text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn into_range(self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    #[serde(default)]
    pub span: Span,
    pub node: T,
}

impl<T> Spanned<T> {
    /// Wraps a node with an empty span (synthesized trees, tests).
    pub fn new(node: T) -> Self {
        Self {
            span: Span::default(),
            node,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub items: Vec<Item>,
}

impl Program {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    Routine(Spanned<RoutineDecl>),
    Statement(Spanned<Statement>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineDecl {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// `None` (or `"void"`) when the routine returns nothing.
    #[serde(default)]
    pub return_type: Option<String>,
    pub body: Vec<Spanned<Statement>>,
}

impl RoutineDecl {
    pub fn new(
        name: impl Into<String>,
        parameters: &[(&str, &str)],
        return_type: Option<&str>,
        body: Vec<Spanned<Statement>>,
    ) -> Self {
        Self {
            name: name.into(),
            parameters: parameters
                .iter()
                .map(|(name, ty)| Parameter {
                    name: (*name).to_string(),
                    ty: (*ty).to_string(),
                })
                .collect(),
            return_type: return_type.map(str::to_string),
            body,
        }
    }

    /// The declared return type, with `void` normalized away.
    pub fn returns(&self) -> Option<&str> {
        self.return_type.as_deref().filter(|ty| *ty != "void")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declarator {
    pub name: String,
    #[serde(default)]
    pub initializer: Option<Spanned<Expression>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    Block(Vec<Spanned<Statement>>),
    Declaration {
        #[serde(rename = "type")]
        ty: String,
        declarators: Vec<Declarator>,
    },
    Assignment {
        target: String,
        #[serde(default)]
        op: AssignOp,
        value: Spanned<Expression>,
    },
    If {
        condition: Spanned<Expression>,
        then_branch: Box<Spanned<Statement>>,
        #[serde(default)]
        else_branch: Option<Box<Spanned<Statement>>>,
    },
    Return(Option<Spanned<Expression>>),
    Expression(Spanned<Expression>),
}

impl Statement {
    pub fn block(statements: Vec<Spanned<Statement>>) -> Spanned<Self> {
        Spanned::new(Statement::Block(statements))
    }

    pub fn declare(
        ty: &str,
        name: &str,
        initializer: Option<Spanned<Expression>>,
    ) -> Spanned<Self> {
        Spanned::new(Statement::Declaration {
            ty: ty.to_string(),
            declarators: vec![Declarator {
                name: name.to_string(),
                initializer,
            }],
        })
    }

    pub fn assign(target: &str, value: Spanned<Expression>) -> Spanned<Self> {
        Self::compound(target, AssignOp::Assign, value)
    }

    pub fn compound(target: &str, op: AssignOp, value: Spanned<Expression>) -> Spanned<Self> {
        Spanned::new(Statement::Assignment {
            target: target.to_string(),
            op,
            value,
        })
    }

    pub fn conditional(
        condition: Spanned<Expression>,
        then_branch: Spanned<Statement>,
        else_branch: Option<Spanned<Statement>>,
    ) -> Spanned<Self> {
        Spanned::new(Statement::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        })
    }

    pub fn ret(value: Option<Spanned<Expression>>) -> Spanned<Self> {
        Spanned::new(Statement::Return(value))
    }

    pub fn expr(expression: Spanned<Expression>) -> Spanned<Self> {
        Spanned::new(Statement::Expression(expression))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    Binary {
        op: BinaryOp,
        left: Box<Spanned<Expression>>,
        right: Box<Spanned<Expression>>,
    },
    Call {
        callee: String,
        #[serde(default)]
        arguments: Vec<Spanned<Expression>>,
    },
    New {
        #[serde(rename = "type")]
        ty: String,
        #[serde(default)]
        arguments: Vec<Spanned<Expression>>,
    },
}

impl Expression {
    pub fn literal(literal: Literal) -> Spanned<Self> {
        Spanned::new(Expression::Literal(literal))
    }

    pub fn ident(name: &str) -> Spanned<Self> {
        Spanned::new(Expression::Identifier(name.to_string()))
    }

    pub fn binary(op: BinaryOp, left: Spanned<Self>, right: Spanned<Self>) -> Spanned<Self> {
        Spanned::new(Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn call(callee: &str, arguments: Vec<Spanned<Self>>) -> Spanned<Self> {
        Spanned::new(Expression::Call {
            callee: callee.to_string(),
            arguments,
        })
    }

    pub fn new_object(ty: &str, arguments: Vec<Spanned<Self>>) -> Spanned<Self> {
        Spanned::new(Expression::New {
            ty: ty.to_string(),
            arguments,
        })
    }
}

/// Literal value together with its primitive type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Bool(bool),
    Byte(u8),
    Sbyte(i8),
    Short(i16),
    Ushort(u16),
    Int(i32),
    Uint(u32),
    Long(i64),
    Ulong(u64),
    Float(f32),
    Double(f64),
    Char(char),
    String(String),
    Null,
    /// Kept as source text; there is no decimal input node.
    Decimal(String),
}

impl Literal {
    /// Constant text as the target's invariant-culture parser expects it.
    pub fn constant_text(&self) -> String {
        match self {
            Literal::Bool(true) => "True".to_string(),
            Literal::Bool(false) => "False".to_string(),
            Literal::Byte(value) => value.to_string(),
            Literal::Sbyte(value) => value.to_string(),
            Literal::Short(value) => value.to_string(),
            Literal::Ushort(value) => value.to_string(),
            Literal::Int(value) => value.to_string(),
            Literal::Uint(value) => value.to_string(),
            Literal::Long(value) => value.to_string(),
            Literal::Ulong(value) => value.to_string(),
            Literal::Float(value) => value.to_string(),
            Literal::Double(value) => value.to_string(),
            Literal::Char(value) => value.to_string(),
            Literal::String(value) => value.clone(),
            Literal::Null => "null".to_string(),
            Literal::Decimal(text) => text.clone(),
        }
    }

    /// Name of the primitive type tag, for labels and diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Bool(_) => "Boolean",
            Literal::Byte(_) => "Byte",
            Literal::Sbyte(_) => "SByte",
            Literal::Short(_) => "Int16",
            Literal::Ushort(_) => "UInt16",
            Literal::Int(_) => "Int32",
            Literal::Uint(_) => "UInt32",
            Literal::Long(_) => "Int64",
            Literal::Ulong(_) => "UInt64",
            Literal::Float(_) => "Single",
            Literal::Double(_) => "Double",
            Literal::Char(_) => "Char",
            Literal::String(_) => "String",
            Literal::Null => "Null",
            Literal::Decimal(_) => "Decimal",
        }
    }

    /// Numeric value, used by constant-only constructs such as `new Color(..)`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Literal::Byte(value) => Some(f64::from(*value)),
            Literal::Sbyte(value) => Some(f64::from(*value)),
            Literal::Short(value) => Some(f64::from(*value)),
            Literal::Ushort(value) => Some(f64::from(*value)),
            Literal::Int(value) => Some(f64::from(*value)),
            Literal::Uint(value) => Some(f64::from(*value)),
            Literal::Float(value) => Some(f64::from(*value)),
            Literal::Double(value) => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    BitwiseAnd,
    BitwiseOr,
    ExclusiveOr,
    LogicalAnd,
    LogicalOr,
    LeftShift,
    RightShift,
    Equals,
    NotEquals,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::ExclusiveOr => "^",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterOrEqual => ">=",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOp {
    #[default]
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    And,
    Or,
    ExclusiveOr,
    LeftShift,
    RightShift,
    Coalesce,
}

impl AssignOp {
    /// The binary operator a compound assignment applies, if any.
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign | AssignOp::Coalesce => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Subtract => Some(BinaryOp::Subtract),
            AssignOp::Multiply => Some(BinaryOp::Multiply),
            AssignOp::Divide => Some(BinaryOp::Divide),
            AssignOp::Modulo => Some(BinaryOp::Modulo),
            AssignOp::And => Some(BinaryOp::BitwiseAnd),
            AssignOp::Or => Some(BinaryOp::BitwiseOr),
            AssignOp::ExclusiveOr => Some(BinaryOp::ExclusiveOr),
            AssignOp::LeftShift => Some(BinaryOp::LeftShift),
            AssignOp::RightShift => Some(BinaryOp::RightShift),
        }
    }
}
