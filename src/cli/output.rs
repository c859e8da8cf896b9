// Status messages for the CLI. These go to stderr; stdout carries log lines.

use colored::*;

/// Print an error message to stderr
pub fn print_error(error: &str) {
    eprintln!("{} {}", "✗ Error:".red().bold(), error);
}

/// Print an informational notice to stderr
pub fn print_notice(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message.dimmed());
}

/// Format an error and its causes on one line
pub fn format_error_chain(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}
