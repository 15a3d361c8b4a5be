//! Terminal output helpers

use anyhow::Result;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Print a section banner
pub fn header(title: &str) {
    println!();
    println!("{}", RULE.blue());
    println!("  {}", title.blue().bold());
    println!("{}", RULE.blue());
    println!();
}

/// Pretty-print any serializable value as JSON
pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Line shown after a successful change
pub fn success(message: &str) {
    println!("  {} {}", "✓".green(), message);
}

/// Line shown when a listing is empty
pub fn empty(what: &str) {
    println!("  {}", format!("No {what} found").dimmed());
}

/// `2024-05-01 18:00` or a dash
pub fn when(value: Option<&DateTime<Utc>>) -> String {
    value.map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string())
}

/// Id column, with a dash for records the backend has not numbered
pub fn id(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |id| id.to_string())
}
