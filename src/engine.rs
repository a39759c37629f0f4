use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    ast::{Program, TraitDecl},
    emit::{emit_with_traits, EmitOptions, TraitImplStrategy},
    errors::{BlockContext, CompileError, ErrorReporting, SourceContext},
    preprocess::{preprocess, BlockKind, CodeBlock},
    syntax::{parse, tokenize},
    transform::transform,
};

// ============================================================================
// OPTIONS
// ============================================================================

/// Knobs that change the generated code. Applied uniformly to a whole compilation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    pub trait_impl: TraitImplStrategy,
}

impl CompileOptions {
    fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            trait_impl: self.trait_impl,
        }
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// preprocess, then for each DSL block: lex, parse, transform, emit.
#[derive(Debug, Clone, Default)]
pub struct CompilePipeline {
    pub options: CompileOptions,
}

impl CompilePipeline {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    // ============================================================================
    // CLI SERVICE METHODS - Pure compilation services for CLI orchestration
    // ============================================================================

    /// Compiles source text with default options (no I/O).
    pub fn compile_source(source: &str) -> Result<String, CompileError> {
        Self::default().compile("<input>", source)
    }

    /// Reads a file with standardized error handling
    pub fn read_file(path: &Path) -> Result<String, CompileError> {
        std::fs::read_to_string(path)
            .map_err(|error| CompileError::io(path.display().to_string(), &error))
    }

    /// Reads and compiles one file; diagnostics are named after the path.
    pub fn compile_file(&self, path: &Path) -> Result<String, CompileError> {
        let source = Self::read_file(path)?;
        self.compile(&path.display().to_string(), &source)
    }

    /// Compiles `source`, naming it `name` in diagnostics.
    ///
    /// Host blocks pass through trimmed; results are joined with a blank line.
    /// Every DSL block is parsed before any is emitted, so an `impl` sees traits
    /// declared in other blocks.
    pub fn compile(&self, name: &str, source: &str) -> Result<String, CompileError> {
        let context = SourceContext::from_file(name, source);
        let emit_options = self.options.emit_options();

        let blocks = preprocess(source);
        let programs = blocks
            .iter()
            .map(|block| match block.kind {
                BlockKind::Dsl => self.block_program(&context, block).map(Some),
                BlockKind::Host => Ok(None),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let traits: Vec<&TraitDecl> = programs
            .iter()
            .flatten()
            .flat_map(|program| program.trait_decls())
            .collect();

        let outputs: Vec<String> = blocks
            .iter()
            .zip(&programs)
            .map(|(block, program)| match program {
                Some(program) => emit_with_traits(program, &emit_options, &traits),
                None => block.text.trim().to_string(),
            })
            .filter(|output| !output.is_empty())
            .collect();

        Ok(outputs.join("\n\n"))
    }

    /// ASTs of every DSL block, in source order.
    pub fn parse(&self, name: &str, source: &str) -> Result<Vec<Program>, CompileError> {
        let context = SourceContext::from_file(name, source);
        preprocess(source)
            .iter()
            .filter(|block| block.kind == BlockKind::Dsl)
            .map(|block| self.block_program(&context, block))
            .collect()
    }

    fn block_program(
        &self,
        context: &SourceContext,
        block: &CodeBlock,
    ) -> Result<Program, CompileError> {
        let reporter = BlockContext::new(context, block.start_offset);
        let tokens = tokenize(&block.text).map_err(|e| reporter.lex_error(e))?;
        let cst = parse(&tokens).map_err(|e| reporter.parse_error(e))?;
        let program = transform(&cst, &block.text).map_err(|e| reporter.transform_error(e))?;
        debug!(
            line = block.start_line,
            tokens = tokens.len(),
            items = program.items.len(),
            "compiled DSL block"
        );
        Ok(program)
    }
}

/// Compile mixed Britescript/TypeScript source with default options.
pub fn compile(source: &str) -> Result<String, CompileError> {
    CompilePipeline::compile_source(source)
}

pub fn compile_with(source: &str, options: &CompileOptions) -> Result<String, CompileError> {
    CompilePipeline::new(*options).compile("<input>", source)
}
