use std::path::Path;

use anyhow::bail;
use ptrscope::analysis::{DataflowSolver, LiveValues};
use ptrscope::ir::{FuncId, Module};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::load_module,
    output::{Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct BlockLiveness {
    block: String,
    live_in: Vec<String>,
    live_out: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FunctionLiveness {
    function: String,
    blocks: Vec<BlockLiveness>,
}

pub fn run(path: &Path, function: Option<&str>, opts: &GlobalOptions) -> anyhow::Result<()> {
    let module = load_module(path)?;

    let selected: Vec<FuncId> = match function {
        Some(name) => match module.function_by_name(name) {
            Some(id) if !module.function(id).is_declaration() => vec![id],
            Some(_) => bail!("function '{name}' is a declaration with no body"),
            None => bail!("no function named '{name}' in '{}'", path.display()),
        },
        None => module
            .functions()
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.is_declaration())
            .map(|(i, _)| FuncId::new(i))
            .collect(),
    };

    let mut output = Vec::new();
    for func in selected {
        output.push(analyze_function(&module, func));
    }

    crate::output::print_output(&output, opts, |functions| {
        for f in functions {
            println!("{}:", f.function);
            let mut tw = TabWriter::new(vec![
                ("Block", Align::Left),
                ("Live-in", Align::Left),
                ("Live-out", Align::Left),
            ]);
            for block in &f.blocks {
                tw.row(vec![
                    block.block.clone(),
                    join_or_dash(&block.live_in),
                    join_or_dash(&block.live_out),
                ]);
            }
            tw.print();
            println!();
        }
    })
}

fn analyze_function(module: &Module, func: FuncId) -> FunctionLiveness {
    let (results, _) = DataflowSolver::new(module, LiveValues::new()).solve(func);
    let f = module.function(func);

    let mut blocks = Vec::new();
    for block in f.blocks() {
        let r = ptrscope::ir::BlockRef::new(func, block.id());
        let names = |state: Option<&ptrscope::analysis::LiveSet>| -> Vec<String> {
            state
                .map(|s| s.iter().map(|v| module.value_name(v)).collect())
                .unwrap_or_default()
        };
        blocks.push(BlockLiveness {
            block: block
                .label()
                .map_or_else(|| block.id().to_string(), str::to_string),
            live_in: names(results.in_state(r)),
            live_out: names(results.out_state(r)),
        });
    }

    FunctionLiveness {
        function: f.name().to_string(),
        blocks,
    }
}

fn join_or_dash(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}
