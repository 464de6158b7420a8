//! Terminal output for CLI commands.
//!
//! Every printer has two renderings. Human mode writes indented, colored
//! lines; `--json` mode writes one `{"type", "payload"}` object per line so
//! scripts can follow along. `--quiet` hides everything except warnings,
//! errors and command results.

use std::fmt::Display;
use std::sync::OnceLock;

use owo_colors::{OwoColorize, Stream, Style};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde_json::{json, Value};

/// Flags shared by every command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    pub json: bool,
    pub quiet: bool,
    /// Number of `-v` flags.
    pub verbose: u8,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            json,
            quiet,
            verbose,
        }
    }
}

static SETTINGS: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn settings() -> OutputConfig {
    *SETTINGS
        .get_or_init(|| RwLock::new(OutputConfig::default()))
        .read()
}

/// Install the global flags. Call once, before any command prints.
pub fn configure(config: OutputConfig) {
    *SETTINGS
        .get_or_init(|| RwLock::new(OutputConfig::default()))
        .write() = config;
}

#[must_use]
pub fn is_json() -> bool {
    settings().json
}

#[must_use]
pub fn is_quiet() -> bool {
    settings().quiet
}

#[must_use]
pub fn verbosity() -> u8 {
    settings().verbose
}

/// How a line behaves under `--quiet`.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Priority {
    Regular,
    Always,
}

/// Apply `style` when the stream supports color and `--color` allows it.
fn paint(text: impl Display, style: Style, stream: Stream) -> String {
    text.if_supports_color(stream, |t| t.style(style)).to_string()
}

fn out(text: impl Display, style: Style) -> String {
    paint(text, style, Stream::Stdout)
}

/// Route one line to JSON or to `render`.
fn emit(kind: &str, payload: Value, priority: Priority, render: impl FnOnce()) {
    let config = settings();
    if config.json {
        println!("{}", json!({ "type": kind, "payload": payload }));
    } else if priority == Priority::Always || !config.quiet {
        render();
    }
}

pub fn header(version: &str) {
    emit(
        "header",
        json!({ "app": "arbiter", "version": version }),
        Priority::Regular,
        || {
            println!(
                "{} {}\n",
                out("arbiter", Style::new().bold()),
                out(version, Style::new().dimmed())
            );
        },
    );
}

pub fn section(title: &str) {
    emit("section", json!({ "title": title }), Priority::Regular, || {
        println!("\n{}", out(title, Style::new().bold()));
    });
}

/// A labeled value, aligned under the section title.
pub fn field(label: &str, value: impl Display) {
    let value = value.to_string();
    emit(
        "field",
        json!({ "label": label, "value": value }),
        Priority::Regular,
        || println!("  {} {}", out(format!("{label:<14}"), Style::new().dimmed()), value),
    );
}

pub fn success(message: &str) {
    emit("success", json!({ "message": message }), Priority::Regular, || {
        println!("  {} {}", out("✓", Style::new().green()), message);
    });
}

/// Shown even under `--quiet`.
pub fn warning(message: &str) {
    emit("warning", json!({ "message": message }), Priority::Always, || {
        println!("  {} {}", out("⚠", Style::new().yellow()), message);
    });
}

/// Written to stderr in both modes.
pub fn error(message: &str) {
    if is_json() {
        eprintln!("{}", json!({ "type": "error", "payload": { "message": message } }));
    } else {
        eprintln!("  {} {}", paint("×", Style::new().red(), Stream::Stderr), message);
    }
}

pub fn note(message: &str) {
    emit("note", json!({ "message": message }), Priority::Regular, || {
        println!("  {}", out(message, Style::new().dimmed()));
    });
}

pub fn hint(message: &str) {
    emit("hint", json!({ "message": message }), Priority::Regular, || {
        println!(
            "  {}: {}",
            out("hint", Style::new().cyan().dimmed()),
            out(message, Style::new().dimmed())
        );
    });
}

/// Pre-rendered block such as a table, indented line by line.
pub fn lines(content: &str) {
    emit("lines", json!({ "content": content }), Priority::Regular, || {
        for line in content.lines() {
            println!("  {line}");
        }
    });
}

/// A command's result document. Printed as-is; commands choose the shape.
pub fn json_output(value: Value) {
    println!("{value}");
}

/// Cyan in human mode, plain in JSON mode.
#[must_use]
pub fn highlight(value: impl Display) -> String {
    if is_json() {
        value.to_string()
    } else {
        out(value, Style::new().cyan())
    }
}

/// Dollar amount, green when positive and red when negative.
#[must_use]
pub fn signed(value: Decimal) -> String {
    let text = format!("${}", value.round_dp(2));
    if is_json() || value.is_zero() {
        text
    } else if value.is_sign_negative() {
        out(text, Style::new().red())
    } else {
        out(text, Style::new().green())
    }
}
