//! Handles all user-facing output for the CLI.
//!
//! Status lines are colorized with `termcolor`; generated code and JSON go to
//! stdout untouched so they can be piped.

use std::io::Write;

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::errors::CompileError;

/// `label` in bold green, then `message`.
pub fn print_status(label: &str, message: &str) {
    print_labeled(Color::Green, label, message);
}

pub fn print_warning(message: &str) {
    print_labeled(Color::Yellow, "warning", message);
}

pub fn print_code(code: &str) {
    println!("{code}");
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CompileError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CompileError::runtime(format!("cannot serialize output: {e}")))?;
    println!("{json}");
    Ok(())
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn print_labeled(color: Color, label: &str, message: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    let _ = write!(stdout, "{label:>10}");
    let _ = stdout.reset();
    let _ = writeln!(stdout, " {message}");
}
