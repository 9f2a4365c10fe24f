//! Output formatting utilities.

use colored::Colorize;
use serde::Serialize;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

use crate::config::OutputFormat;

/// Rows that can be reduced to an identifier in quiet mode.
pub trait Identified {
    /// Primary identifier of the row.
    fn identifier(&self) -> &str;
}

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Outputs rows in the specified format.
pub fn output<T: Tabled + Serialize + Identified>(
    data: &[T],
    format: OutputFormat,
) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                info("No results found.");
            } else {
                println!("{}", Table::new(data).with(Style::rounded()));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Quiet => {
            for item in data {
                println!("{}", item.identifier());
            }
        }
    }
    Ok(())
}

/// Outputs a single item as a field/value table.
pub fn output_single<T: Tabled + Serialize + Identified>(
    item: &T,
    format: OutputFormat,
) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table => println!("{}", render_single(item)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(item)?),
        OutputFormat::Quiet => println!("{}", item.identifier()),
    }
    Ok(())
}

/// Renders one item with its headers down the first column.
fn render_single<T: Tabled>(item: &T) -> String {
    let mut builder = Builder::default();
    for (header, value) in T::headers().into_iter().zip(item.fields()) {
        builder.push_record([header.into_owned(), value.into_owned()]);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled, Serialize)]
    struct Row {
        id: String,
        city: String,
    }

    #[test]
    fn single_item_lists_fields_vertically() {
        let rendered = render_single(&Row {
            id: "psc".to_string(),
            city: "Paris".to_string(),
        });
        let lines: Vec<&str> = rendered.lines().collect();

        assert!(lines.iter().any(|l| l.contains("id") && l.contains("psc")));
        assert!(lines.iter().any(|l| l.contains("city") && l.contains("Paris")));
    }
}
