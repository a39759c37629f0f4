//! Defines the command-line arguments and subcommands for the `brite` CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::emit::TraitImplStrategy;
use crate::project::CONFIG_FILE;
use crate::runtime::Target;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "brite",
    version,
    about = "Britescript: structs, traits, pipes and pattern matching compiled to TypeScript."
)]
pub struct BriteArgs {
    /// Print debug logs to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a britescript.yaml and a starter module.
    Init {
        /// Project directory.
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Compile every module under the configured source directory.
    Build {
        /// Path to the project configuration.
        #[arg(long, default_value = CONFIG_FILE)]
        config: PathBuf,
    },
    /// Compile one file to TypeScript.
    Compile {
        /// The Britescript file to compile.
        #[arg(required = true)]
        file: PathBuf,
        /// Output file; defaults to the input path with a .ts extension.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Runtime the output is meant for.
        #[arg(short, long, default_value = "bun")]
        target: Target,
        /// Drop blank lines and indentation.
        #[arg(short, long)]
        minify: bool,
        /// Trait implementation strategy: functional or adapter.
        #[arg(long)]
        trait_impl: Option<TraitImplStrategy>,
    },
    /// Compile a file and execute it with a JavaScript runtime.
    Run {
        /// The Britescript file to run.
        #[arg(required = true)]
        file: PathBuf,
        /// Runtime to execute with; defaults to the project target.
        #[arg(short, long)]
        target: Option<Target>,
        /// Trait implementation strategy: functional or adapter.
        #[arg(long)]
        trait_impl: Option<TraitImplStrategy>,
    },
    /// Interactive prompt that prints the TypeScript for each input.
    Repl {
        /// Trait implementation strategy: functional or adapter.
        #[arg(long)]
        trait_impl: Option<TraitImplStrategy>,
    },
    /// Show the AST of every Britescript block in a file as JSON.
    Ast {
        /// The Britescript file to parse.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Print the compiler version.
    Version,
}
