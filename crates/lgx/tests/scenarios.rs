use std::collections::HashMap;

use lgx::ast::{BinaryOp, Expression, Item, Literal, RoutineDecl, Spanned, Statement};
use lgx::catalog;
use lgx::{DiagnosticKind, Graph, LoweringConfig, NodeId, Program, Record, lower_program};

fn float(value: f32) -> Spanned<Expression> {
    Expression::literal(Literal::Float(value))
}

fn routine(
    name: &str,
    parameters: &[(&str, &str)],
    returns: Option<&str>,
    body: Vec<Spanned<Statement>>,
) -> Item {
    Item::Routine(Spanned::new(RoutineDecl::new(name, parameters, returns, body)))
}

/// `Tick(float speed)`: `time` is bound before the conditional, overwritten
/// in the `then` arm and passed to `Sink` afterwards.
fn speed_program() -> Program {
    Program::new(vec![
        routine("Sink", &[("value", "float")], None, vec![]),
        routine(
            "Tick",
            &[("speed", "float")],
            None,
            vec![
                Statement::declare(
                    "float",
                    "time",
                    Some(Expression::binary(
                        BinaryOp::Multiply,
                        Expression::call("Time.CurrentTime", vec![]),
                        Expression::ident("speed"),
                    )),
                ),
                Statement::conditional(
                    Expression::binary(BinaryOp::Equals, Expression::ident("speed"), float(0.0)),
                    Statement::block(vec![Statement::assign("time", float(1.0))]),
                    None,
                ),
                Statement::expr(Expression::call("Sink", vec![Expression::ident("time")])),
            ],
        ),
    ])
}

/// Incoming impulse wire of `(node, method)`.
fn impulse_into(graph: &Graph, node: NodeId, method: &str) -> Option<(NodeId, String)> {
    graph
        .impulse_wires()
        .find(|(destination, wired, ..)| *destination == node && *wired == method)
        .map(|(_, _, source, impulse)| (source, impulse.to_string()))
}

#[test]
fn branch_write_is_reconciled_through_a_register() {
    let lowered = lower_program(&speed_program(), &LoweringConfig::default()).unwrap();
    let graph = &lowered.graph;
    assert!(lowered.diagnostics.is_empty(), "{:?}", lowered.diagnostics);

    let sequencers = graph.nodes_of_kind(catalog::SEQUENCE);
    assert_eq!(sequencers.len(), 1);
    let sequencer = sequencers[0];

    let registers = graph.nodes_of_kind(catalog::VALUE_REGISTER);
    assert_eq!(registers.len(), 1);
    let register = registers[0];
    assert_eq!(
        graph.kind_of(register).unwrap(),
        "FrooxEngine.LogiX.Data.ValueRegister<System.Single>"
    );

    let writers = graph.writers_of(register);
    assert_eq!(writers.len(), 2);

    // Pre-branch capture hangs off the reserved sequencer output.
    let product = graph.nodes_of_kind("Operators.Mul_Float")[0];
    assert_eq!(graph.data_source(writers[0], "Value"), Some((product, "*")));
    assert_eq!(
        impulse_into(graph, writers[0], "Write"),
        Some((sequencer, "Sequence[0]".to_string()))
    );

    // The `then` arm writes its literal right after the conditional's True.
    let branch = graph.nodes_of_kind(catalog::IF)[0];
    let one = graph
        .nodes_of_kind("Input.FloatInput")
        .into_iter()
        .find(|node| graph.constant(*node) == Some("1"))
        .unwrap();
    assert_eq!(graph.data_source(writers[1], "Value"), Some((one, "*")));
    assert_eq!(
        impulse_into(graph, writers[1], "Write"),
        Some((branch, "True".to_string()))
    );
    assert_eq!(
        impulse_into(graph, branch, "Run"),
        Some((sequencer, "Sequence[1]".to_string()))
    );

    // The reader after the conditional sees the register, and runs from the
    // sequencer's next output.
    let set_arg = graph
        .nodes_of_kind(catalog::WRITE_DYNAMIC_VARIABLE)
        .into_iter()
        .find(|node| graph.nodes()[node.0 as usize].label == "SetArg value")
        .unwrap();
    assert_eq!(graph.data_source(set_arg, "Value"), Some((register, "*")));
    assert_eq!(
        impulse_into(graph, set_arg, "Write"),
        Some((sequencer, "Sequence[2]".to_string()))
    );
}

#[test]
fn declaration_then_read_shares_the_producer() {
    let program = Program::new(vec![routine(
        "Copy",
        &[],
        None,
        vec![
            Statement::declare("float", "a", Some(float(3.0))),
            Statement::declare("float", "b", Some(Expression::ident("a"))),
            Statement::declare(
                "float",
                "c",
                Some(Expression::binary(BinaryOp::Add, Expression::ident("b"), float(1.0))),
            ),
        ],
    )]);
    let lowered = lower_program(&program, &LoweringConfig::default()).unwrap();
    let graph = &lowered.graph;
    let three = graph.nodes_of_kind("Input.FloatInput")[0];
    let add = graph.nodes_of_kind("Operators.Add_Int")[0];
    assert_eq!(graph.data_source(add, "A"), Some((three, "*")));
    assert!(graph.nodes_of_kind(catalog::VALUE_REGISTER).is_empty());
}

#[test]
fn top_level_call_without_parameters() {
    let program = Program::new(vec![
        routine("Blink", &[], None, vec![]),
        Item::Statement(Statement::expr(Expression::call("Blink", vec![]))),
    ]);
    let lowered = lower_program(&program, &LoweringConfig::default()).unwrap();
    let graph = &lowered.graph;
    let triggers = graph.nodes_of_kind(catalog::IMPULSE_TRIGGER);
    assert_eq!(triggers.len(), 1);
    let tag = graph.data_source(triggers[0], "Tag").unwrap().0;
    assert_eq!(graph.constant(tag), Some("Blink"));
    assert!(graph.nodes_of_kind(catalog::WRITE_DYNAMIC_VARIABLE).is_empty());
}

#[test]
fn unsupported_call_leaves_the_statement_intact() {
    let program = Program::new(vec![routine(
        "Wobble",
        &[("amount", "float")],
        None,
        vec![
            Statement::declare("float", "base", Some(float(2.0))),
            Statement::expr(Expression::call("Math.Sin", vec![Expression::ident("amount")])),
            Statement::declare(
                "float",
                "scaled",
                Some(Expression::binary(
                    BinaryOp::Multiply,
                    Expression::ident("base"),
                    Expression::ident("amount"),
                )),
            ),
        ],
    )]);
    let lowered = lower_program(&program, &LoweringConfig::default()).unwrap();
    assert_eq!(lowered.diagnostics.len(), 1);
    assert_eq!(lowered.diagnostics[0].kind, DiagnosticKind::UnsupportedCall);
    assert!(lowered.diagnostics[0].message.contains("Math.Sin"));

    let graph = &lowered.graph;
    let product = graph.nodes_of_kind("Operators.Mul_Float")[0];
    let base = graph.nodes_of_kind("Input.FloatInput")[0];
    let amount = graph.nodes_of_kind(catalog::READ_DYNAMIC_VARIABLE)[0];
    assert_eq!(graph.data_source(product, "A"), Some((base, "*")));
    assert_eq!(graph.data_source(product, "B"), Some((amount, "Value")));
}

#[test]
fn linear_routine_is_a_single_chain() {
    let program = Program::new(vec![
        routine("Note", &[("value", "float")], None, vec![]),
        routine(
            "Twice",
            &[("x", "float")],
            Some("float"),
            vec![
                Statement::declare(
                    "float",
                    "y",
                    Some(Expression::binary(
                        BinaryOp::Multiply,
                        Expression::ident("x"),
                        float(2.0),
                    )),
                ),
                Statement::expr(Expression::call("Note", vec![Expression::ident("y")])),
                Statement::ret(Some(Expression::ident("y"))),
            ],
        ),
    ]);
    let lowered = lower_program(&program, &LoweringConfig::default()).unwrap();
    let graph = &lowered.graph;

    let mut next: HashMap<NodeId, NodeId> = HashMap::new();
    let mut incoming: HashMap<NodeId, usize> = HashMap::new();
    for (destination, _, source, _) in graph.impulse_wires() {
        assert!(next.insert(source, destination).is_none(), "fan-out from {source}");
        *incoming.entry(destination).or_default() += 1;
    }
    assert!(incoming.values().all(|count| *count == 1));

    let receiver = graph
        .nodes_of_kind(catalog::IMPULSE_RECEIVER)
        .into_iter()
        .find(|node| graph.nodes()[node.0 as usize].label == "Twice")
        .unwrap();
    let mut chain = vec![receiver];
    while let Some(following) = next.get(chain.last().unwrap()) {
        chain.push(*following);
    }
    let labels: Vec<_> = chain
        .iter()
        .map(|node| graph.nodes()[node.0 as usize].label.as_str())
        .collect();
    assert_eq!(labels, ["Twice", "SetArg value", "Calling Note", "Twice Return"]);
    assert_eq!(next.len(), chain.len() - 1);
}

#[test]
fn program_from_json() {
    let json = r#"{ "items": [
        { "routine": { "node": {
            "name": "Glow",
            "parameters": [ { "name": "level", "type": "float" } ],
            "return_type": "Color",
            "body": [
                { "span": { "start": 40, "end": 80 }, "node": { "return":
                    { "node": { "call": {
                        "callee": "Color.FromHSV",
                        "arguments": [
                            { "node": { "identifier": "level" } },
                            { "node": { "literal": { "float": 1.0 } } },
                            { "node": { "literal": { "float": 1.0 } } }
                        ]
                    } } } } }
            ]
        } } },
        { "statement": { "span": { "start": 90, "end": 105 }, "node": { "expression":
            { "span": { "start": 90, "end": 104 }, "node": { "call": { "callee": "Explode" } } } } } }
    ] }"#;
    let program: Program = serde_json::from_str(json).unwrap();
    let lowered = lower_program(&program, &LoweringConfig::default()).unwrap();
    assert_eq!(lowered.graph.nodes_of_kind(catalog::HSV_TO_COLOR).len(), 1);
    assert_eq!(lowered.diagnostics.len(), 1);
    assert_eq!(lowered.diagnostics[0].span, Some(lgx::Span::new(90, 104)));

    let records = lowered.graph.into_records();
    assert_eq!(
        records[0],
        Record::DeclareProgram {
            title: "Test program".into(),
            version: 2
        }
    );
}
