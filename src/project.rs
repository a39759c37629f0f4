//! Project configuration (`britescript.yaml`) and whole-project builds.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::emit::TraitImplStrategy;
use crate::engine::{CompileOptions, CompilePipeline};
use crate::errors::CompileError;
use crate::loader::is_britescript_file;
use crate::runtime::Target;

pub const CONFIG_FILE: &str = "britescript.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
    pub src_dir: PathBuf,
    pub out_dir: PathBuf,
    pub entry: PathBuf,
    pub target: Target,
    pub trait_impl: TraitImplStrategy,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "britescript-app".into(),
            src_dir: PathBuf::from("src"),
            out_dir: PathBuf::from("dist"),
            entry: PathBuf::from("src/main.bs"),
            target: Target::default(),
            trait_impl: TraitImplStrategy::default(),
        }
    }
}

impl ProjectConfig {
    /// Load a config file. A missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, CompileError> {
        if !path.exists() {
            debug!(path = %path.display(), "no project config, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .map_err(|e| CompileError::io(path.display().to_string(), &e))?;
        Self::from_yaml(&path.display().to_string(), &text)
    }

    pub fn from_yaml(name: &str, text: &str) -> Result<Self, CompileError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| CompileError::config(name, e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String, CompileError> {
        serde_yaml::to_string(self).map_err(|e| CompileError::config(CONFIG_FILE, e.to_string()))
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            trait_impl: self.trait_impl,
        }
    }
}

/// Compile every `.bs`/`.bsx` file under `root/src_dir` into `root/out_dir`,
/// mirroring the directory layout. Returns the written files, sorted.
pub fn build(root: &Path, config: &ProjectConfig) -> Result<Vec<PathBuf>, CompileError> {
    let src_dir = root.join(&config.src_dir);
    let out_dir = root.join(&config.out_dir);
    let pipeline = CompilePipeline::new(config.compile_options());

    let mut sources = Vec::new();
    for entry in WalkDir::new(&src_dir) {
        let entry = entry.map_err(|e| {
            let io = std::io::Error::other(e.to_string());
            CompileError::io(src_dir.display().to_string(), &io)
        })?;
        if entry.file_type().is_file() && is_britescript_file(entry.path()) {
            sources.push(entry.into_path());
        }
    }
    sources.sort();

    let mut written = Vec::with_capacity(sources.len());
    for source in sources {
        let relative = source.strip_prefix(&src_dir).unwrap_or(&source);
        let output = out_dir.join(relative).with_extension("ts");
        let code = pipeline.compile_file(&source)?;

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CompileError::io(parent.display().to_string(), &e))?;
        }
        fs::write(&output, code).map_err(|e| CompileError::io(output.display().to_string(), &e))?;
        info!(from = %source.display(), to = %output.display(), "compiled");
        written.push(output);
    }
    Ok(written)
}

/// Scaffold a new project in `dir`: config file plus an entry module.
/// Existing files are left untouched.
pub fn init(dir: &Path) -> Result<Vec<PathBuf>, CompileError> {
    let config = ProjectConfig {
        name: dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("britescript-app")
            .to_string(),
        ..ProjectConfig::default()
    };

    let files = [
        (dir.join(CONFIG_FILE), config.to_yaml()?),
        (dir.join(&config.entry), STARTER_MODULE.to_string()),
    ];

    let mut created = Vec::new();
    for (path, contents) in files {
        if path.exists() {
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CompileError::io(parent.display().to_string(), &e))?;
        }
        fs::write(&path, contents).map_err(|e| CompileError::io(path.display().to_string(), &e))?;
        created.push(path);
    }
    Ok(created)
}

const STARTER_MODULE: &str = r#"struct User {
  name: string
  age: number
}

trait Greet {
  greet(): string
}

impl Greet for User {
  greet() {
    return "Hello, " + self.name;
  }
}

const user: User = { name: "Ada", age: 36 };
UserGreet.greet(user) |> print
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config =
            ProjectConfig::from_yaml("t.yaml", "name: demo\ntarget: deno\ntrait_impl: adapter\n")
                .unwrap();
        assert_eq!(config.name, "demo");
        assert_eq!(config.target, Target::Deno);
        assert_eq!(config.trait_impl, TraitImplStrategy::CapabilityAdapter);
        assert_eq!(config.out_dir, PathBuf::from("dist"));
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let err = ProjectConfig::from_yaml("t.yaml", "target: [").unwrap_err();
        assert_eq!(err.diagnostic_info.error_code, "britescript::config");
    }

    #[test]
    fn init_then_build() {
        let dir = tempfile::tempdir().unwrap();
        let created = init(dir.path()).unwrap();
        assert_eq!(created.len(), 2);

        let config = ProjectConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        let written = build(dir.path(), &config).unwrap();
        assert_eq!(written, [dir.path().join("dist/main.ts")]);

        let code = fs::read_to_string(&written[0]).unwrap();
        assert!(code.contains("type User = {"));
        assert!(code.contains("const UserGreet = {"));
        assert!(code.contains("console.log(UserGreet.greet(user));"));
    }

    #[test]
    fn init_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "name: mine\n").unwrap();
        let created = init(dir.path()).unwrap();
        assert_eq!(created, [dir.path().join("src/main.bs")]);
        let kept = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(kept, "name: mine\n");
    }
}
