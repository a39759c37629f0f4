//! Build-tool adapter: turns a `.bs` path into TypeScript contents or a list of
//! diagnostics a bundler plugin can render.

use std::path::Path;

use serde::Serialize;

use crate::engine::{CompileOptions, CompilePipeline};
use crate::errors::CompileError;

pub const EXTENSIONS: &[&str] = &["bs", "bsx"];

/// Which loader the host build tool should apply to the generated contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    Ts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadDiagnostic {
    pub text: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LoadResult {
    Loaded { contents: String, loader: LoaderKind },
    Failed { errors: Vec<LoadDiagnostic> },
}

pub fn is_britescript_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext))
}

pub fn load_file(path: &Path) -> LoadResult {
    load_file_with(path, &CompileOptions::default())
}

pub fn load_file_with(path: &Path, options: &CompileOptions) -> LoadResult {
    let file = path.display().to_string();
    if !is_britescript_file(path) {
        return failed(&file, "not a Britescript file (expected .bs or .bsx)".into(), 1, 0);
    }

    match CompilePipeline::new(*options).compile_file(path) {
        Ok(contents) => LoadResult::Loaded {
            contents,
            loader: LoaderKind::Ts,
        },
        Err(error) => from_error(&file, &error),
    }
}

fn from_error(file: &str, error: &CompileError) -> LoadResult {
    failed(file, error.to_string(), error.line(), error.column())
}

fn failed(file: &str, text: String, line: usize, column: usize) -> LoadResult {
    LoadResult::Failed {
        errors: vec![LoadDiagnostic {
            text,
            file: file.to_string(),
            line,
            column,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_extensions() {
        assert!(is_britescript_file(Path::new("a/b.bs")));
        assert!(is_britescript_file(Path::new("view.bsx")));
        assert!(!is_britescript_file(Path::new("main.ts")));
        assert!(!is_britescript_file(Path::new("bs")));
    }

    #[test]
    fn wrong_extension_fails_at_line_one() {
        let LoadResult::Failed { errors } = load_file(Path::new("main.ts")) else {
            panic!("expected failure");
        };
        assert_eq!((errors[0].line, errors[0].column), (1, 0));
        assert_eq!(errors[0].file, "main.ts");
    }

    #[test]
    fn loads_compiled_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.bs");
        std::fs::write(&path, "let x = :ready\n").unwrap();
        assert_eq!(
            load_file(&path),
            LoadResult::Loaded {
                contents: "const x = Symbol.for(\"ready\");".into(),
                loader: LoaderKind::Ts,
            }
        );
    }

    #[test]
    fn compile_failure_carries_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bs");
        std::fs::write(&path, "const a = 1;\nstruct 9 {}\n").unwrap();
        let LoadResult::Failed { errors } = load_file(&path) else {
            panic!("expected failure");
        };
        assert_eq!(errors[0].line, 2);
        assert_eq!(errors[0].column, 8);
        assert!(errors[0].text.contains("expected identifier"));
    }
}
