use std::path::Path;

use anyhow::Result;
use lgx::Registry;

/// Prints every node kind the lowerer may emit with its connectors, then the
/// type names declarations may use.
pub fn run(config: Option<&Path>) -> Result<()> {
    let registry = Registry::standard();
    for kind in registry.kinds() {
        println!("{}", kind.class_name);
        for input in &kind.inputs {
            println!("    in  {}: {}", input.name, input.ty);
        }
        for (index, output) in kind.outputs.iter().enumerate() {
            let marker = if kind.default_output == Some(index) { " (default)" } else { "" };
            println!("    out {}: {}{marker}", output.name, output.ty);
        }
        if !kind.methods.is_empty() {
            println!("    methods  {}", kind.methods.join(", "));
        }
        if !kind.impulses.is_empty() {
            println!("    impulses {}", kind.impulses.join(", "));
        }
    }

    println!();
    let types = super::load_config(config)?.type_table();
    for (source, target) in types.iter() {
        println!("{source} -> {target}");
    }
    eprintln!("{} kinds", registry.len());
    Ok(())
}
