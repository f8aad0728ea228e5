//! Terminal output helpers shared by the subcommands.
//!
//! Everything here writes to stdout and is silenced by `--quiet` through
//! [`set_quiet`]; errors go to stderr from `main`.
use colored::*;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static QUIET: AtomicBool = AtomicBool::new(false);

pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Check if colors should be disabled
pub fn colors_enabled() -> bool {
    std::env::var("NO_COLOR").is_err()
        && std::env::var("CLICOLOR").unwrap_or_else(|_| "1".to_string()) != "0"
}

pub fn init(quiet: bool) {
    set_quiet(quiet);
    if !colors_enabled() {
        colored::control::set_override(false);
    }
}

pub fn section_header(title: &str) {
    if is_quiet() {
        return;
    }
    println!("\n{} {}", "▶".cyan().bold(), title.bold());
    println!("{}", "─".repeat(60).dimmed());
}

pub fn success(message: &str) {
    if !is_quiet() {
        println!("{} {}", "✓".green().bold(), message);
    }
}

pub fn warning(message: &str) {
    if !is_quiet() {
        println!("{} {}", "⚠".yellow(), format!("Warning: {}", message).yellow());
    }
}

/// Print a tree-style item, optionally with a right-hand value.
pub fn tree_item(is_last: bool, label: &str, value: Option<&str>) {
    if is_quiet() {
        return;
    }
    let prefix = if is_last { "└─" } else { "├─" };
    match value {
        Some(v) => println!("  {} {}: {}", prefix.dimmed(), label, v.bold()),
        None => println!("  {} {}", prefix.dimmed(), label),
    }
}

/// Print a list of `(label, value)` pairs as a tree.
pub fn tree_section(items: &[(&str, String)]) {
    for (i, (label, value)) in items.iter().enumerate() {
        tree_item(i + 1 == items.len(), label, Some(value));
    }
}

pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .add_attribute(Attribute::Bold)
        .fg(Color::Cyan)
}

pub fn create_standard_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Print a two-column statistics table.
pub fn print_stats_table(title: &str, stats: &[(&str, String)]) {
    if is_quiet() {
        return;
    }
    let mut table = create_standard_table();
    table.set_header(vec![header_cell(title), header_cell("")]);
    for (label, value) in stats {
        table.add_row(vec![Cell::new(label), Cell::new(value).fg(Color::Green)]);
    }
    println!("\n{}", table);
}

/// Spinner for an indeterminate step; hidden in quiet mode.
pub fn spinner(message: &str) -> ProgressBar {
    if is_quiet() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print formatted number with thousands separator
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2 KiB");
    }
}
