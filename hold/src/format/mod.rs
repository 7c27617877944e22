use crate::context::{AppContext, VerbosityLevel};
use libhold::config::ColorChoice;
use owo_colors::OwoColorize;
use std::io::IsTerminal;

pub mod render;
pub mod template;

pub use render::{Renderer, TabledRenderer};
pub use template::Template;

/// Trait for output formatting that can be TTY-aware or plain text
pub trait OutputFormatter: Send + Sync {
    /// Print an error message
    fn error(&self, message: &str);

    /// Print a warning message
    fn warning(&self, message: &str);
}

/// TTY-aware formatter with colors
pub struct TtyFormatter;

impl OutputFormatter for TtyFormatter {
    fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message);
    }

    fn warning(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow().bold(), message);
    }
}

/// Plain text formatter for non-TTY output (piped, scripted)
pub struct PlainFormatter;

impl OutputFormatter for PlainFormatter {
    fn error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    fn warning(&self, message: &str) {
        eprintln!("⚠ {}", message);
    }
}

/// Check if we should use colors in output
pub fn should_color(ctx: &AppContext) -> bool {
    match ctx.config.output.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => {
            std::env::var("NO_COLOR").is_err()
                && (std::io::stdout().is_terminal() || std::io::stderr().is_terminal())
        }
    }
}

/// Create the appropriate formatter for the context
pub fn create_formatter(ctx: &AppContext) -> Box<dyn OutputFormatter> {
    if should_color(ctx) {
        Box::new(TtyFormatter)
    } else {
        Box::new(PlainFormatter)
    }
}

/// Print an error message with optional coloring
pub fn error(ctx: &AppContext, message: &str) {
    create_formatter(ctx).error(message);
}

/// Print a warning message with optional coloring
pub fn warning(ctx: &AppContext, message: &str) {
    create_formatter(ctx).warning(message);
}

/// Print a progress message to stderr if the verbosity allows it
pub fn print(ctx: &AppContext, level: VerbosityLevel, message: &str) {
    if level != VerbosityLevel::Normal && ctx.verbosity >= level {
        eprintln!("{}", message);
    }
}
