use std::path::Path;

use ptrscope::analysis::entry_function;
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::load_module,
    output::{Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct FunctionInfo {
    name: String,
    kind: String,
    blocks: usize,
    instructions: usize,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    functions: usize,
    globals: usize,
    values: usize,
    entry: Option<String>,
    per_function: Vec<FunctionInfo>,
}

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let module = load_module(path)?;

    let per_function: Vec<FunctionInfo> = module
        .functions()
        .iter()
        .map(|f| FunctionInfo {
            name: f.name().to_string(),
            kind: if f.is_declaration() {
                "declare".to_string()
            } else {
                "func".to_string()
            },
            blocks: f.blocks().len(),
            instructions: f.blocks().iter().map(|b| b.instructions().len()).sum(),
        })
        .collect();

    let output = InfoOutput {
        functions: module.functions().len(),
        globals: module.globals().len(),
        values: module.value_count(),
        entry: entry_function(&module).map(|id| module.function(id).name().to_string()),
        per_function,
    };

    crate::output::print_output(&output, opts, |info| {
        println!(
            "Module: {} functions, {} globals, {} values",
            info.functions, info.globals, info.values
        );
        println!(
            "Analysis entry: {}",
            info.entry.as_deref().unwrap_or("none")
        );
        println!();

        let mut tw = TabWriter::new(vec![
            ("Function", Align::Left),
            ("Kind", Align::Left),
            ("Blocks", Align::Right),
            ("Insts", Align::Right),
        ]);
        for f in &info.per_function {
            tw.row(vec![
                f.name.clone(),
                f.kind.clone(),
                f.blocks.to_string(),
                f.instructions.to_string(),
            ]);
        }
        tw.print();
    })
}
