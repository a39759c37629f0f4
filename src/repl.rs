//! Britescript REPL (Read-Compile-Print Loop)
//!
//! Buffers input until braces balance, compiles the buffer and prints the
//! generated TypeScript.

use std::io::{self, BufRead, Write};

use crate::{
    cli::output,
    engine::{CompileOptions, CompilePipeline},
    errors::{print_error, CompileError},
};

/// REPL state that persists across inputs
pub struct ReplState {
    pipeline: CompilePipeline,
    input_number: usize,
}

impl ReplState {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            pipeline: CompilePipeline::new(options),
            input_number: 1,
        }
    }

    /// Compile one complete input; each input is named `<repl:N>` in diagnostics.
    pub fn compile_input(&mut self, input: &str) -> Result<String, CompileError> {
        let source_name = format!("<repl:{}>", self.input_number);
        self.input_number += 1;
        self.pipeline.compile(&source_name, input)
    }
}

/// Main REPL entry point
pub fn run(options: &CompileOptions) -> Result<(), CompileError> {
    println!("Britescript REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type :help for help, :quit to exit, :clear to discard pending input");
    println!();

    let mut state = ReplState::new(*options);
    let mut buffer = String::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{}", if buffer.is_empty() { "brite> " } else { "  ...> " });
        io::stdout()
            .flush()
            .map_err(|e| CompileError::io("<stdout>", &e))?;

        let Some(line) = lines.next() else {
            println!("\nGoodbye!");
            return Ok(());
        };
        let line = line.map_err(|e| CompileError::io("<stdin>", &e))?;

        if buffer.is_empty() && line.trim().starts_with(':') {
            match handle_repl_command(line.trim()) {
                ReplCommand::Continue => continue,
                ReplCommand::Clear => {
                    buffer.clear();
                    println!("Input cleared.");
                    continue;
                }
                ReplCommand::Quit => return Ok(()),
            }
        }

        buffer.push_str(&line);
        buffer.push('\n');

        // A blank line forces compilation of an unbalanced buffer.
        if is_complete_input(&buffer) || line.trim().is_empty() {
            if !buffer.trim().is_empty() {
                match state.compile_input(&buffer) {
                    Ok(code) => output::print_code(&code),
                    Err(e) => print_error(e),
                }
            }
            buffer.clear();
        }
    }
}

/// REPL command results
enum ReplCommand {
    Continue,
    Clear,
    Quit,
}

/// Handle special REPL commands that start with ':'
fn handle_repl_command(command: &str) -> ReplCommand {
    match command.to_ascii_lowercase().as_str() {
        ":help" | ":h" => {
            println!("Britescript REPL Commands:");
            println!("  :help, :h     Show this help");
            println!("  :quit, :q     Exit the REPL");
            println!("  :clear, :c    Discard pending multi-line input");
            println!();
            println!("Enter Britescript or TypeScript to see the generated code.");
            println!("Input continues until braces balance; a blank line compiles what you have.");
            ReplCommand::Continue
        }
        ":quit" | ":q" => {
            println!("Goodbye!");
            ReplCommand::Quit
        }
        ":clear" | ":c" => ReplCommand::Clear,
        _ => {
            println!("Unknown command: {command}. Type :help for available commands.");
            ReplCommand::Continue
        }
    }
}

/// Braces balanced and no open string literal.
fn is_complete_input(input: &str) -> bool {
    if input.trim().is_empty() {
        return false;
    }

    let mut depth = 0i64;
    let mut in_string = false;
    let mut escape_next = false;

    for ch in input.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => depth -= 1,
            _ => {}
        }
    }

    depth <= 0 && !in_string
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completeness_tracks_braces_and_strings() {
        assert!(is_complete_input("let x = 1"));
        assert!(is_complete_input("struct A { x: number }"));
        assert!(is_complete_input("let s = \"{\""));

        assert!(!is_complete_input("struct A {"));
        assert!(!is_complete_input("impl A {\n  f() {\n  }\n"));
        assert!(!is_complete_input("let s = \"open"));
        assert!(!is_complete_input("   "));
    }

    #[test]
    fn inputs_are_numbered_in_diagnostics() {
        let mut state = ReplState::new(CompileOptions::default());
        assert_eq!(
            state.compile_input("let x = :ok\n").unwrap(),
            "const x = Symbol.for(\"ok\");"
        );
        let err = state.compile_input("struct 1 {}\n").unwrap_err();
        assert_eq!(err.source_info.source.name(), "<repl:2>");
    }
}
