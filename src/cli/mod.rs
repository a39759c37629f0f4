//! The Britescript Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions. Every handler returns a `CompileError` on failure;
//! `run` renders it with miette and exits with status 1.

use std::{
    fs,
    path::{Path, PathBuf},
    process,
};

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    emit::TraitImplStrategy,
    engine::{CompileOptions, CompilePipeline},
    errors::{print_error, CompileError},
    project::{self, ProjectConfig, CONFIG_FILE},
    repl,
    runtime::{self, Target},
};

pub mod args;
pub mod output;

use args::{BriteArgs, Command};

/// The main entry point for the CLI.
pub fn run() {
    let args = BriteArgs::parse();
    init_tracing(args.verbose);

    let result = match args.command {
        Command::Init { dir } => handle_init(&dir),
        Command::Build { config } => handle_build(&config),
        Command::Compile {
            file,
            output,
            target,
            minify,
            trait_impl,
        } => handle_compile(&file, output, target, minify, trait_impl),
        Command::Run {
            file,
            target,
            trait_impl,
        } => handle_run(&file, target, trait_impl),
        Command::Repl { trait_impl } => {
            resolve_options(trait_impl).and_then(|options| repl::run(&options))
        }
        Command::Ast { file } => handle_ast(&file),
        Command::Version => {
            println!("brite {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(e) = result {
        print_error(e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "britescript=debug"
    } else {
        "britescript=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn handle_init(dir: &Path) -> Result<(), CompileError> {
    let created = project::init(dir)?;
    if created.is_empty() {
        output::print_warning(&format!("nothing to do, {} is already set up", dir.display()));
    }
    for path in created {
        output::print_status("Created", &path.display().to_string());
    }
    Ok(())
}

fn handle_build(config_path: &Path) -> Result<(), CompileError> {
    let config = ProjectConfig::load(config_path)?;
    let root = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let written = project::build(&root, &config)?;
    if written.is_empty() {
        output::print_warning(&format!(
            "no .bs files found under {}",
            root.join(&config.src_dir).display()
        ));
    }
    for path in &written {
        output::print_status("Compiled", &path.display().to_string());
    }
    Ok(())
}

fn handle_compile(
    file: &Path,
    output: Option<PathBuf>,
    target: Target,
    minify: bool,
    trait_impl: Option<TraitImplStrategy>,
) -> Result<(), CompileError> {
    let options = resolve_options(trait_impl)?;
    debug!(%target, trait_impl = %options.trait_impl, "compiling {}", file.display());

    let code = CompilePipeline::new(options).compile_file(file)?;
    let code = if minify { minify_code(&code) } else { code };

    let output_path = output.unwrap_or_else(|| file.with_extension("ts"));
    fs::write(&output_path, format!("{code}\n"))
        .map_err(|e| CompileError::io(output_path.display().to_string(), &e))?;
    output::print_status(
        "Compiled",
        &format!("{} -> {}", file.display(), output_path.display()),
    );
    Ok(())
}

fn handle_run(
    file: &Path,
    target: Option<Target>,
    trait_impl: Option<TraitImplStrategy>,
) -> Result<(), CompileError> {
    let config = ProjectConfig::load(Path::new(CONFIG_FILE))?;
    let options = CompileOptions {
        trait_impl: trait_impl.unwrap_or(config.trait_impl),
    };
    runtime::run_file(file, target.unwrap_or(config.target), &options)
}

fn handle_ast(file: &Path) -> Result<(), CompileError> {
    let source = CompilePipeline::read_file(file)?;
    let programs = CompilePipeline::default().parse(&file.display().to_string(), &source)?;
    output::print_json(&programs)
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Flags win over `britescript.yaml` in the working directory.
fn resolve_options(trait_impl: Option<TraitImplStrategy>) -> Result<CompileOptions, CompileError> {
    let config = ProjectConfig::load(Path::new(CONFIG_FILE))?;
    Ok(CompileOptions {
        trait_impl: trait_impl.unwrap_or(config.trait_impl),
    })
}

/// Drop blank lines and leading indentation.
pub fn minify_code(code: &str) -> String {
    code.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minify_drops_blank_lines_and_indentation() {
        let code = "type A = {\n  x: number;\n};\n\nconsole.log(1);";
        assert_eq!(minify_code(code), "type A = {\nx: number;\n};\nconsole.log(1);");
    }

    #[test]
    fn args_parse_compile_flags() {
        let args = BriteArgs::try_parse_from([
            "brite", "compile", "main.bs", "-o", "out.ts", "-t", "deno", "-m", "--trait-impl",
            "adapter",
        ])
        .unwrap();
        let Command::Compile {
            file,
            output,
            target,
            minify,
            trait_impl,
        } = args.command
        else {
            panic!("expected compile");
        };
        assert_eq!(file, PathBuf::from("main.bs"));
        assert_eq!(output, Some(PathBuf::from("out.ts")));
        assert_eq!(target, Target::Deno);
        assert!(minify);
        assert_eq!(trait_impl, Some(TraitImplStrategy::CapabilityAdapter));
    }

    #[test]
    fn unknown_target_is_rejected() {
        assert!(BriteArgs::try_parse_from(["brite", "compile", "a.bs", "-t", "ruby"]).is_err());
    }
}
