//! Line-oriented `.lgx` text format.
//!
//! One record per line. Free text (titles, slot and variable names, node
//! labels, constants) is Base64-encoded and double-quoted; kind, connector and
//! type names are single-quoted verbatim.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use lgx::Record;

fn payload(text: &str) -> String {
    format!("\"{}\"", STANDARD.encode(text))
}

pub fn record_line(record: &Record) -> String {
    match record {
        Record::DeclareProgram { title, version } => {
            format!("PROGRAM {} {version}", payload(title))
        }
        Record::DeclareSlot { slot, name } => format!("SLOT {slot} {}", payload(name)),
        Record::DeclareNode { node, kind, label } => {
            format!("NODE {node} '{kind}' {}", payload(&format!("Node {node} {label}")))
        }
        Record::SetLayout { node, x, y } => format!("POS {node} {x} {y}"),
        Record::SetConstant { node, value } => format!("SETCONST {node} {}", payload(value)),
        Record::ConnectData {
            consumer,
            input,
            producer,
            output,
        } => format!("INPUT {consumer} '{input}' {producer} '{output}'"),
        Record::ConnectImpulse {
            destination,
            method,
            source,
            impulse,
        } => format!("IMPULSE {destination} '{method}' {source} '{impulse}'"),
        Record::DeclareVariable { slot, name, ty } => {
            format!("VAR {slot} {} '{ty}'", payload(name))
        }
        Record::BindNodeToSlot { node, input, slot } => {
            format!("SETNODESLOT {node} '{input}' {slot}")
        }
        Record::WriteTarget { register, writer } => format!("WRITE {register} {writer}"),
    }
}

/// The whole program, newline-terminated.
pub fn to_text(records: &[Record]) -> String {
    let mut text = String::new();
    for record in records {
        text.push_str(&record_line(record));
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use lgx::{NodeId, SlotId};

    #[test]
    fn payloads_are_base64() {
        assert_eq!(
            record_line(&Record::DeclareProgram {
                title: "Test program".into(),
                version: 2
            }),
            "PROGRAM \"VGVzdCBwcm9ncmFt\" 2"
        );
        assert_eq!(
            record_line(&Record::DeclareNode {
                node: NodeId(0),
                kind: "FrooxEngine.LogiX.Input.FloatInput".into(),
                label: "Literal Single".into(),
            }),
            "NODE 0 'FrooxEngine.LogiX.Input.FloatInput' \"Tm9kZSAwIExpdGVyYWwgU2luZ2xl\""
        );
        assert_eq!(
            record_line(&Record::SetConstant {
                node: NodeId(0),
                value: "2.5".into()
            }),
            "SETCONST 0 \"Mi41\""
        );
    }

    #[test]
    fn slots_are_prefixed() {
        let lines = to_text(&[
            Record::DeclareSlot {
                slot: SlotId(1),
                name: "Tick".into(),
            },
            Record::DeclareVariable {
                slot: SlotId(1),
                name: "speed".into(),
                ty: "System.Single".into(),
            },
            Record::BindNodeToSlot {
                node: NodeId(4),
                input: "Source".into(),
                slot: SlotId(1),
            },
        ]);
        assert_eq!(
            lines,
            "SLOT S1 \"VGljaw==\"\n\
             VAR S1 \"c3BlZWQ=\" 'System.Single'\n\
             SETNODESLOT 4 'Source' S1\n"
        );
    }

    #[test]
    fn wires() {
        assert_eq!(
            record_line(&Record::ConnectImpulse {
                destination: NodeId(7),
                method: "Run".into(),
                source: NodeId(3),
                impulse: "Sequence[1]".into(),
            }),
            "IMPULSE 7 'Run' 3 'Sequence[1]'"
        );
        assert_eq!(
            record_line(&Record::ConnectData {
                consumer: NodeId(7),
                input: "Condition".into(),
                producer: NodeId(6),
                output: "*".into(),
            }),
            "INPUT 7 'Condition' 6 '*'"
        );
        assert_eq!(
            record_line(&Record::WriteTarget {
                register: NodeId(9),
                writer: NodeId(10),
            }),
            "WRITE 9 10"
        );
    }
}
