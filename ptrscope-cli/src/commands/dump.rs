use std::path::Path;

use serde::Serialize;

use crate::{app::GlobalOptions, commands::common::load_module};

#[derive(Debug, Serialize)]
struct DumpOutput {
    text: String,
}

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let module = load_module(path)?;
    let output = DumpOutput {
        text: module.to_string(),
    };
    crate::output::print_output(&output, opts, |dump| {
        print!("{}", dump.text);
    })
}
