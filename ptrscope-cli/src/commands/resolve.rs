use std::path::Path;

use log::info;
use ptrscope::analysis::resolve_call_targets;
use serde::Serialize;

use crate::{app::GlobalOptions, commands::common::load_module};

#[derive(Debug, Serialize)]
struct SiteOutput {
    line: u32,
    callees: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ResolveOutput {
    call_sites: Vec<SiteOutput>,
}

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let module = load_module(path)?;
    let results = resolve_call_targets(&module);
    info!(
        "{} call sites resolved in '{}'",
        results.len(),
        path.display()
    );

    let output = ResolveOutput {
        call_sites: results
            .iter()
            .map(|(line, names)| SiteOutput {
                line,
                callees: names.iter().cloned().collect(),
            })
            .collect(),
    };

    print_results(&output, &results, opts)
}

fn print_results(
    output: &ResolveOutput,
    results: &ptrscope::analysis::CallSiteResults,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    crate::output::print_output(output, opts, |_| {
        print!("{results}");
    })
}
