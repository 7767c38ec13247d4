use std::path::Path;

use anyhow::Context;
use ptrscope::ir::{self, Module};

/// Read and parse a textual IR file.
pub fn load_module(path: &Path) -> anyhow::Result<Module> {
    ir::parse_file(path).with_context(|| format!("failed to load '{}'", path.display()))
}
