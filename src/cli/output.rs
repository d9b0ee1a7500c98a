//! Output formatting utilities for CLI commands

use is_terminal::IsTerminal;
use std::io::{self, Write};

/// Write output to file or stdout
pub fn write_output(content: &str, path: Option<&str>) -> Result<(), String> {
    if let Some(path) = path {
        std::fs::write(path, content).map_err(|e| format!("Failed to write to {}: {}", path, e))?;
    } else {
        print!("{}", content);
        io::stdout()
            .flush()
            .map_err(|e| format!("Failed to flush stdout: {}", e))?;
    }
    Ok(())
}

/// Colorize text with ANSI escape codes (only if stdout is a terminal)
pub fn color(code: &str, text: &str) -> String {
    if io::stdout().is_terminal() {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

/// Format a coefficient; `NaN` prints as `undefined`.
pub fn format_coefficient(value: f64) -> String {
    if value.is_nan() {
        "undefined".to_string()
    } else {
        format!("{:.4}", value)
    }
}

/// Format a coefficient with color based on strength
pub fn coefficient_colored(value: f64) -> String {
    let code = if value.is_nan() {
        "90"
    } else if value >= 0.8 {
        "1;32"
    } else if value >= 0.6 {
        "1;33"
    } else if value >= 0.4 {
        "33"
    } else {
        "1;31"
    };
    color(code, &format_coefficient(value))
}

/// Color code for a configuration set status
pub fn status_color(status: &str) -> &'static str {
    match status {
        "agree" => "32",
        "differ" => "1;31",
        "incomplete" => "33",
        "stacked" => "35",
        _ => "37",
    }
}
