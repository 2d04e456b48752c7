//! Output formatting for fleetctl

use anyhow::Result;
use clap::ValueEnum;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use fleet_core::{GroupId, InstanceDescription};
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Compact text format
    Text,
}

/// Types that can be rendered as table rows or key-value blocks
pub trait Formattable {
    fn table_headers() -> Vec<String>;
    fn table_row(&self) -> Vec<String>;

    /// Key-value view used by the text format
    fn key_value_pairs(&self) -> Vec<(String, String)>;
}

/// One member of a described group
#[derive(Debug, Clone, Serialize)]
pub struct InstanceRow {
    pub group: String,
    pub id: String,
    pub tags: String,
}

impl InstanceRow {
    pub fn from_description(group: &GroupId, instance: &InstanceDescription) -> Self {
        let tags = instance
            .tags
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",");
        Self {
            group: group.to_string(),
            id: instance.id.to_string(),
            tags,
        }
    }
}

impl Formattable for InstanceRow {
    fn table_headers() -> Vec<String> {
        vec!["Group".to_string(), "Instance".to_string(), "Tags".to_string()]
    }

    fn table_row(&self) -> Vec<String> {
        vec![self.group.clone(), self.id.clone(), self.tags.clone()]
    }

    fn key_value_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("Group".to_string(), self.group.clone()),
            ("Instance".to_string(), self.id.clone()),
            ("Tags".to_string(), self.tags.clone()),
        ]
    }
}

/// One entry of the provider call log
#[derive(Debug, Clone, Serialize)]
pub struct CallRow {
    pub seq: usize,
    pub call: String,
}

impl Formattable for CallRow {
    fn table_headers() -> Vec<String> {
        vec!["#".to_string(), "Provider call".to_string()]
    }

    fn table_row(&self) -> Vec<String> {
        vec![self.seq.to_string(), self.call.clone()]
    }

    fn key_value_pairs(&self) -> Vec<(String, String)> {
        vec![(self.seq.to_string(), self.call.clone())]
    }
}

/// Output formatter
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// True when output must stay machine readable
    pub fn is_structured(&self) -> bool {
        matches!(self.format, OutputFormat::Json | OutputFormat::Yaml)
    }

    /// Serialize any value in the structured formats
    pub fn print_value<T: Serialize>(&self, value: &T) -> Result<()> {
        match self.format {
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
            _ => println!("{}", serde_json::to_string_pretty(value)?),
        }
        Ok(())
    }

    /// Format and print a list of items
    pub fn print_list<T>(&self, items: &[T]) -> Result<()>
    where
        T: Serialize + Formattable,
    {
        match self.format {
            OutputFormat::Json | OutputFormat::Yaml => self.print_value(&items)?,
            OutputFormat::Table if items.is_empty() => {
                println!("{}", "No items found".dimmed());
            }
            OutputFormat::Table => self.print_table(items),
            OutputFormat::Text => {
                for item in items {
                    let line = item
                        .key_value_pairs()
                        .into_iter()
                        .map(|(key, value)| format!("{}: {}", key, value))
                        .collect::<Vec<_>>()
                        .join("  ");
                    println!("{}", line);
                }
            }
        }
        Ok(())
    }

    fn print_table<T: Formattable>(&self, items: &[T]) {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        let headers: Vec<Cell> = T::table_headers()
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold).fg(Color::Cyan))
            .collect();
        table.set_header(headers);

        for item in items {
            table.add_row(item.table_row());
        }

        println!("{}", table);
    }

    pub fn print_success(&self, message: &str) {
        if !self.is_structured() {
            println!("{} {}", "✓".green().bold(), message);
        }
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    }

    pub fn print_warning(&self, message: &str) {
        if !self.is_structured() {
            println!("{} {}", "⚠".yellow().bold(), message.yellow());
        }
    }

    pub fn print_info(&self, message: &str) {
        if !self.is_structured() {
            println!("{} {}", "ℹ".blue().bold(), message);
        }
    }

    pub fn print_section(&self, title: &str) {
        if !self.is_structured() {
            println!("\n{}", title.bold().underline());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::InstanceId;
    use std::collections::BTreeMap;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
        assert!(OutputFormatter::new(OutputFormat::Yaml).is_structured());
        assert!(!OutputFormatter::new(OutputFormat::Text).is_structured());
    }

    #[test]
    fn test_instance_rows() {
        let mut tags = BTreeMap::new();
        tags.insert("role".to_string(), "web".to_string());
        tags.insert("tier".to_string(), "front".to_string());

        let instance = InstanceDescription {
            id: InstanceId::new("web-0001"),
            tags,
        };

        let row = InstanceRow::from_description(&GroupId::new("web"), &instance);
        assert_eq!(row.table_row(), vec!["web", "web-0001", "role=web,tier=front"]);
        assert_eq!(InstanceRow::table_headers().len(), row.table_row().len());
    }

    #[test]
    fn test_call_row_pairs() {
        let row = CallRow {
            seq: 3,
            call: "DeleteInstanceGroupManager".to_string(),
        };
        assert_eq!(row.table_row(), vec!["3", "DeleteInstanceGroupManager"]);
        assert_eq!(row.key_value_pairs()[0].0, "3");
    }
}
