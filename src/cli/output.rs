//! Output formatting utilities for the CLI.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Borderless list table with upper-case headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Render a table under a count line, or a "none found" message.
pub fn render_list(entity_name: &str, table: &Table, total: usize) -> String {
    if total == 0 {
        return format!("No {entity_name}s found.");
    }
    let noun = if total == 1 {
        entity_name.to_string()
    } else {
        format!("{entity_name}s")
    };
    format!("{total} {noun}:\n{table}")
}

/// Truncate a string to a maximum number of characters, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Win rate as a percentage with the raw counts.
pub fn format_rate(wins: u32, total: u32, rate: f64) -> String {
    format!("{:.1}% ({wins}/{total})", rate * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Whoosa good ferret!", 10), "Whoosa ...");
        assert_eq!(truncate("ferrét ferrét", 8), "ferré...");
    }

    #[test]
    fn test_render_list() {
        let table = list_table(&["id"]);
        assert_eq!(render_list("trial", &table, 0), "No trials found.");
        assert!(render_list("trial", &table, 1).starts_with("1 trial:"));
        assert!(render_list("trial", &table, 3).starts_with("3 trials:"));
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(3, 4, 0.75), "75.0% (3/4)");
        assert_eq!(format_rate(0, 0, 0.0), "0.0% (0/0)");
    }
}
