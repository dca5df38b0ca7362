//! Lowers structured imperative programs (routines, blocks, conditionals,
//! locals, calls, returns) into LogiX node graphs: typed nodes joined by data
//! wires and impulse wires, with branch merges materialized as value registers
//! and calls emulated through slot-scoped dynamic variables.
//!
//! ```no_run
//! use lgx::{LoweringConfig, Program, lower_program};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let program: Program = serde_json::from_str(r#"{ "items": [] }"#)?;
//! let lowered = lower_program(&program, &LoweringConfig::default())?;
//! for record in lowered.records() {
//!     println!("{record:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod ast;
pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod lower;
pub mod registry;
pub mod scope;
pub mod types;

pub use ast::{Program, Span, Spanned};
pub use config::{LayoutConfig, LoweringConfig};
pub use error::{Diagnostic, DiagnosticKind, LowerError, Result};
pub use graph::{Graph, NodeId, Record, SlotId};
pub use lower::{Lowered, lower_program, lower_program_with};
pub use registry::{Connector, KindInfo, Registry};
pub use types::TypeTable;
