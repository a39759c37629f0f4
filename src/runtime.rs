//! Dynamic loading: compile a Britescript file to a temporary TypeScript module and
//! execute it with an external runtime.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

use crate::engine::{CompileOptions, CompilePipeline};
use crate::errors::CompileError;

/// JavaScript runtime used to execute generated TypeScript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Bun,
    Node,
    Deno,
}

impl Target {
    pub fn program(&self) -> &'static str {
        match self {
            Target::Bun => "bun",
            Target::Node => "node",
            Target::Deno => "deno",
        }
    }

    /// The command that runs `script` on this runtime.
    pub fn command(&self, script: &Path) -> Command {
        let mut command = Command::new(self.program());
        match self {
            Target::Bun | Target::Deno => command.arg("run"),
            Target::Node => command.arg("--experimental-strip-types"),
        };
        command.arg(script);
        command
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bun" => Ok(Target::Bun),
            "node" => Ok(Target::Node),
            "deno" => Ok(Target::Deno),
            other => Err(format!(
                "unknown target '{other}' (expected bun, node or deno)"
            )),
        }
    }
}

/// Compile `path` into a named `.ts` temp file. The file is deleted when dropped.
pub fn compile_to_temp(path: &Path, options: &CompileOptions) -> Result<NamedTempFile, CompileError> {
    let code = CompilePipeline::new(*options).compile_file(path)?;
    let mut file = Builder::new()
        .prefix("britescript-")
        .suffix(".ts")
        .tempfile()
        .map_err(|e| CompileError::io("<temp>", &e))?;
    file.write_all(code.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| CompileError::io(file.path().display().to_string(), &e))?;
    debug!(source = %path.display(), module = %file.path().display(), "wrote compiled module");
    Ok(file)
}

/// Compile and execute `path`; the temp module is removed afterwards on a best-effort basis.
pub fn run_file(path: &Path, target: Target, options: &CompileOptions) -> Result<(), CompileError> {
    let module = compile_to_temp(path, options)?;
    let status = target.command(module.path()).status();

    if let Err(error) = module.close() {
        warn!(%error, "could not remove temporary module");
    }

    let status = status.map_err(|e| {
        CompileError::runtime(format!("failed to start '{}': {e}", target.program()))
            .with_help(format!("install {target} or pick another runtime with --target"))
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(CompileError::runtime(format!(
            "'{}' exited with {status}",
            target.program()
        )))
    }
}
