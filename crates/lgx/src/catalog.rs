//! The standard node catalogue and the fixed source-to-kind tables.
//!
//! Operator selection is keyed by operator kind only, never by operand type:
//! `+` always lowers to `Add_Int`, `*` to `Mul_Float`, and so on. Operators
//! without an entry are reported as unsupported rather than guessed.

use crate::ast::{BinaryOp, Literal};
use crate::registry::{Connector, GENERIC_ARGUMENT, Registry};

pub const SEQUENCE: &str = "ProgramFlow.SequenceImpulse";
pub const IF: &str = "ProgramFlow.IfNode";
pub const IMPULSE_RECEIVER: &str = "ProgramFlow.DynamicImpulseReceiver";
pub const IMPULSE_TRIGGER: &str = "ProgramFlow.DynamicImpulseTrigger";
pub const VALUE_REGISTER: &str = "Data.ValueRegister";
pub const WRITE_VALUE: &str = "Actions.WriteValueNode";
pub const READ_DYNAMIC_VARIABLE: &str = "Data.ReadDynamicVariable";
pub const WRITE_DYNAMIC_VARIABLE: &str = "Data.WriteDynamicVariable";
pub const STRING_INPUT: &str = "Input.StringInput";
pub const COLOR_TEXT_INPUT: &str = "Input.ColorTextInput";
pub const TIME_INPUT: &str = "Input.TimeNode";
pub const HSV_TO_COLOR: &str = "Color.HSV_ToColor";

/// Indexed impulse output of a sequencer.
pub fn sequence_output(index: usize) -> String {
    format!("Sequence[{index}]")
}

/// `Kind<Argument>`.
pub fn generic(kind: &str, argument: &str) -> String {
    format!("{kind}<{argument}>")
}

const LITERAL_INPUTS: &[(&str, &str)] = &[
    ("Input.BoolInput", "System.Boolean"),
    ("Input.ByteInput", "System.Byte"),
    ("Input.SbyteInput", "System.SByte"),
    ("Input.ShortInput", "System.Int16"),
    ("Input.UshortInput", "System.UInt16"),
    ("Input.IntInput", "System.Int32"),
    ("Input.UintInput", "System.UInt32"),
    ("Input.LongInput", "System.Int64"),
    ("Input.UlongInput", "System.UInt64"),
    ("Input.FloatInput", "System.Single"),
    ("Input.DoubleInput", "System.Double"),
    ("Input.CharInput", "System.Char"),
    ("Input.StringInput", "System.String"),
    ("Input.TimeNode", "System.DateTime"),
    ("Input.ColorInput", "BaseX.color"),
    ("Input.ColorTextInput", "BaseX.color"),
];

const ARITHMETIC: &[(&str, &str)] = &[
    ("Operators.Add_Float", "System.Single"),
    ("Operators.Add_Int", "System.Int32"),
    ("Operators.Mul_Float", "System.Single"),
    ("Operators.Mul_Int", "System.Int32"),
    ("Operators.Div_Float", "System.Single"),
    ("Operators.Div_Int", "System.Int32"),
    ("Operators.Sub_Float", "System.Single"),
    ("Operators.Sub_Int", "System.Int32"),
];

const COMPARISONS: &[&str] = &[
    "Operators.GreaterThan_Float",
    "Operators.GreaterOrEqual_Float",
    "Operators.Equals_Float",
    "Operators.LessThan_Float",
];

/// Input node kind for a literal, or `None` when the literal's type has none.
pub fn literal_input(literal: &Literal) -> Option<&'static str> {
    let kind = match literal {
        Literal::Bool(_) => "Input.BoolInput",
        Literal::Byte(_) => "Input.ByteInput",
        Literal::Sbyte(_) => "Input.SbyteInput",
        Literal::Short(_) => "Input.ShortInput",
        Literal::Ushort(_) => "Input.UshortInput",
        Literal::Int(_) => "Input.IntInput",
        Literal::Uint(_) => "Input.UintInput",
        Literal::Long(_) => "Input.LongInput",
        Literal::Ulong(_) => "Input.UlongInput",
        Literal::Float(_) => "Input.FloatInput",
        Literal::Double(_) => "Input.DoubleInput",
        Literal::Char(_) => "Input.CharInput",
        Literal::String(_) => "Input.StringInput",
        Literal::Null | Literal::Decimal(_) => return None,
    };
    Some(kind)
}

/// Fixed operator table.
pub fn binary_operator(op: BinaryOp) -> Option<&'static str> {
    let kind = match op {
        BinaryOp::Add => "Operators.Add_Int",
        BinaryOp::Subtract => "Operators.Sub_Int",
        BinaryOp::Multiply => "Operators.Mul_Float",
        BinaryOp::Divide => "Operators.Div_Int",
        BinaryOp::BitwiseAnd => "Operators.AND_Bool",
        BinaryOp::GreaterThan => "Operators.GreaterThan_Float",
        BinaryOp::GreaterOrEqual => "Operators.GreaterOrEqual_Float",
        BinaryOp::Equals => "Operators.Equals_Float",
        BinaryOp::LessThan => "Operators.LessThan_Float",
        // No direct node; would need NOT(GreaterThan) and friends.
        BinaryOp::LessOrEqual
        | BinaryOp::NotEquals
        | BinaryOp::Modulo
        | BinaryOp::BitwiseOr
        | BinaryOp::ExclusiveOr
        | BinaryOp::LogicalAnd
        | BinaryOp::LogicalOr
        | BinaryOp::LeftShift
        | BinaryOp::RightShift => return None,
    };
    Some(kind)
}

/// Built-in function lowered to a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtin {
    pub name: &'static str,
    pub kind: &'static str,
    /// Node inputs fed by the call's arguments, in order.
    pub inputs: &'static [&'static str],
}

const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "Color.FromHSV",
        kind: HSV_TO_COLOR,
        inputs: &["H", "S", "V"],
    },
    Builtin {
        name: "Time.CurrentTime",
        kind: TIME_INPUT,
        inputs: &[],
    },
];

pub fn builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

impl Registry {
    /// Registry pre-populated with every kind the lowering emits.
    pub fn standard() -> Self {
        let mut registry = Registry::new();

        for (kind, ty) in LITERAL_INPUTS {
            registry.define_input(kind, ty);
        }
        for (kind, ty) in ARITHMETIC {
            registry.define_binary(kind, ty, ty);
        }
        for kind in COMPARISONS {
            registry.define_binary(kind, "System.Single", "System.Boolean");
        }
        registry.define_binary("Operators.AND_Bool", "System.Boolean", "System.Boolean");

        registry.define(
            HSV_TO_COLOR,
            &[
                Connector::new("H", "System.Single"),
                Connector::new("S", "System.Single"),
                Connector::new("V", "System.Single"),
            ],
            &[Connector::new("*", "BaseX.color")],
            Some(0),
        );

        registry.define(
            VALUE_REGISTER,
            &[],
            &[Connector::new("*", GENERIC_ARGUMENT)],
            Some(0),
        );
        registry
            .define(
                WRITE_VALUE,
                &[Connector::new("Value", GENERIC_ARGUMENT)],
                &[],
                None,
            )
            .impulse_flow(&["Write"], &["OnDone", "OnFail"]);
        registry.define(
            READ_DYNAMIC_VARIABLE,
            &[
                Connector::new("Source", "FrooxEngine.Slot"),
                Connector::new("VariableName", "System.String"),
            ],
            &[
                Connector::new("Value", GENERIC_ARGUMENT),
                Connector::new("FoundValue", "System.Boolean"),
            ],
            Some(0),
        );
        registry
            .define(
                WRITE_DYNAMIC_VARIABLE,
                &[
                    Connector::new("Target", "FrooxEngine.Slot"),
                    Connector::new("VariableName", "System.String"),
                    Connector::new("Value", GENERIC_ARGUMENT),
                ],
                &[],
                None,
            )
            .impulse_flow(&["Write"], &["OnSuccess", "OnFailure"]);

        registry
            .define(SEQUENCE, &[], &[], None)
            .impulse_flow(&["Trigger"], &["Sequence[]"]);
        registry
            .define(
                IF,
                &[Connector::new("Condition", "System.Boolean")],
                &[],
                None,
            )
            .impulse_flow(&["Run"], &["True", "False"]);
        registry
            .define(
                IMPULSE_RECEIVER,
                &[Connector::new("Tag", "System.String")],
                &[],
                None,
            )
            .impulse_flow(&[], &["Impulse"]);
        registry
            .define(
                IMPULSE_TRIGGER,
                &[
                    Connector::new("TargetHierarchy", "FrooxEngine.Slot"),
                    Connector::new("Tag", "System.String"),
                ],
                &[],
                None,
            )
            .impulse_flow(&["Run"], &["OnTriggered"]);

        registry
    }
}
