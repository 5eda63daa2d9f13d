//! Release builds through cargo.

use super::{CommandRunner, Compiler};
use crate::error::Result;
use std::path::Path;
use std::process::Command;

/// `cargo build --release`
#[derive(Debug, Clone, Copy)]
pub struct CargoCompiler {
    runner: CommandRunner,
}

impl CargoCompiler {
    /// Create a compiler driver
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }
}

impl Compiler for CargoCompiler {
    fn build_release(&self, project_root: &Path, binary: &str) -> Result<()> {
        let mut command = Command::new("cargo");
        command
            .args(["build", "--release", "--bin", binary])
            .current_dir(project_root);
        self.runner.mutate(command)?;
        Ok(())
    }
}
