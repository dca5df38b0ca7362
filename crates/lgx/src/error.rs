//! Error and diagnostic types for lowering.
//!
//! Two tiers, matching how a malformed input is treated:
//! - [`LowerError`] aborts the whole lowering. These signal a defect in the
//!   traversal or in the catalogue, not a limitation of the supported language.
//! - [`Diagnostic`] is collected and lowering continues. The offending construct
//!   emits nothing, and the graph stays internally consistent.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::ast::Span;

/// Fatal lowering errors.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerError {
    /// A node kind was emitted or looked up without being registered first.
    #[error("unknown node kind `{0}`")]
    UnknownKind(String),

    /// A data input/output or impulse signal the kind does not declare.
    #[error("node kind `{kind}` has no connector `{connector}`")]
    UnknownConnector { kind: String, connector: String },

    /// A name that no enclosing scope declares.
    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),

    /// A second declaration of a name in the same scope.
    #[error("`{0}` is already declared in this scope")]
    DuplicateDeclaration(String),

    /// A source type name with no target type mapping.
    #[error("unknown type `{0}`")]
    UnknownType(String),

    /// Unbalanced push/pop of scopes, sequences or checkpoint zones.
    #[error("malformed collection state: {0}")]
    MalformedCollectionState(String),
}

pub type Result<T, E = LowerError> = std::result::Result<T, E>;

/// Categories of non-fatal diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// Call target is neither a declared routine nor a built-in, or the call
    /// shape (argument count, recursion) cannot be lowered.
    UnsupportedCall,
    /// Operator without a fixed node kind.
    UnsupportedOperator,
    /// Literal whose primitive type has no input node.
    UnsupportedLiteralType,
    /// Syntactic form outside the supported subset.
    UnsupportedConstruct,
    /// A sub-expression that should have produced a value did not.
    MissingValue,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::UnsupportedCall => "unsupported call",
            DiagnosticKind::UnsupportedOperator => "unsupported operator",
            DiagnosticKind::UnsupportedLiteralType => "unsupported literal type",
            DiagnosticKind::UnsupportedConstruct => "unsupported construct",
            DiagnosticKind::MissingValue => "missing value",
        };
        f.write_str(name)
    }
}

/// A non-fatal issue found while lowering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Source span of the construct that was skipped.
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
