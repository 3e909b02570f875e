use chrono::{DateTime, Utc};
use colored::Colorize;
use crate::schedule::{Outcome, SkipReason};

/// Format timestamp in human-readable format
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn format_optional_timestamp(timestamp: Option<&DateTime<Utc>>) -> String {
    timestamp.map(format_timestamp).unwrap_or_else(|| "-".to_string())
}

/// Truncate long values so table columns stay aligned
pub fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let kept: String = value.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Colored label for a classification outcome
pub fn format_outcome(outcome: Outcome, reason: SkipReason) -> String {
    match outcome {
        Outcome::WillUpdate => "Will update".green().to_string(),
        Outcome::WillSkip => format!("Skip: {}", reason).yellow().to_string(),
        Outcome::Error => format!("Error: {}", reason).red().to_string(),
    }
}

/// Turn comma separated input into one entry per line
pub fn split_list(raw: &str) -> String {
    raw.split(',').collect::<Vec<_>>().join("\n")
}

/// Prompt user for yes/no confirmation
pub fn confirm_action(prompt: &str) -> bool {
    use std::io::{self, Write};

    print!("{} (y/N): ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (i, col) in columns.iter().enumerate() {
        if i < widths.len() {
            row.push_str(&format!("{:<width$}  ", col, width = widths[i]));
        }
    }
    println!("{}", row.trim_end());
}
