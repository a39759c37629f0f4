//! Britescript compiles a small DSL of structs, traits, pipes and pattern
//! matching, embedded in TypeScript, into plain TypeScript.
//!
//! ```
//! let ts = britescript::compile("let x = \"hi\" |> trim |> console.log").unwrap();
//! assert_eq!(ts, "const x = console.log(\"hi\".trim());");
//! ```

pub use crate::emit::TraitImplStrategy;
pub use crate::engine::{compile, compile_with, CompileOptions, CompilePipeline};
pub use crate::errors::{CompileError, ErrorKind};

pub mod ast;
pub mod atoms;
pub mod cli;
pub mod emit;
pub mod engine;
pub mod errors;
pub mod loader;
pub mod preprocess;
pub mod project;
pub mod repl;
pub mod runtime;
pub mod syntax;
pub mod transform;
