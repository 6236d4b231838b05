//! Table formatting utilities for CLI list commands
//!
//! One formatter shared by every list command: aligned TSV with colors for
//! terminals, RFC 4180 CSV through the `csv` crate, markdown through
//! `tabled`, and bare id output for piping.

use chrono::NaiveDate;
use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::truncate_str;
use crate::cli::OutputFormat;
use crate::core::graph::RelationType;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Record ID (cyan, truncated in TSV)
    Id(String),
    /// Short ID reference (e.g., "CO@1", cyan)
    ShortId(String),
    /// Plain text, truncated to the column width
    Text(String),
    /// Company or other record name (yellow)
    Name(String),
    /// Relationship type with color coding
    Relation(RelationType),
    /// Calendar date
    Date(NaiveDate),
    /// Date that may be missing ("-")
    OptionalDate(Option<NaiveDate>),
    Number(i64),
    /// Yes/no flag (yes is bold)
    Flag(bool),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => {
                let display = if id.len() > 16 {
                    format!("{}...", &id[..13])
                } else {
                    id.clone()
                };
                format!("{:<width$}", style(&display).cyan(), width = width)
            }
            CellValue::ShortId(sid) => format!("{:<width$}", style(sid).cyan(), width = width),
            CellValue::Text(s) => {
                let truncated = truncate_str(s, width.saturating_sub(2));
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Name(s) => {
                let truncated = truncate_str(s, width.saturating_sub(2));
                format!("{:<width$}", style(truncated).yellow(), width = width)
            }
            CellValue::Relation(relation) => {
                let styled = match relation {
                    RelationType::Ownership => style(relation.as_str()).green(),
                    RelationType::Investment => style(relation.as_str()).magenta(),
                    RelationType::Other => style(relation.as_str()).dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Date(d) => format!("{:<width$}", d.format("%Y-%m-%d"), width = width),
            CellValue::OptionalDate(Some(d)) => CellValue::Date(*d).format_tsv(width),
            CellValue::OptionalDate(None) | CellValue::Empty => {
                format!("{:<width$}", style("-").dim(), width = width)
            }
            CellValue::Number(n) => format!("{:>width$}", n, width = width),
            CellValue::Flag(true) => format!("{:<width$}", style("yes").bold(), width = width),
            CellValue::Flag(false) => format!("{:<width$}", style("no").dim(), width = width),
        }
    }

    /// Get raw string value (no formatting, used for CSV, markdown and IDs)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::ShortId(s) | CellValue::Text(s) | CellValue::Name(s) => {
                s.clone()
            }
            CellValue::Relation(relation) => relation.as_str().to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::OptionalDate(d) => d.map(|d| d.to_string()).unwrap_or_default(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Flag(b) => (if *b { "yes" } else { "no" }).to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Format for Markdown output (escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::OptionalDate(None) | CellValue::Empty => "-".to_string(),
            CellValue::Flag(true) => "**yes**".to_string(),
            other => other.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Id(id) => id.len().min(16),
            CellValue::Date(_) => 10,
            CellValue::OptionalDate(_) => 10,
            CellValue::Flag(_) => 3,
            CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub short_id: String,
    pub full_id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(full_id: impl Into<String>, short_id: Option<String>) -> Self {
        Self {
            short_id: short_id.unwrap_or_default(),
            full_id: full_id.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter for list output
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    entity_prefix: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(
        columns: &'a [ColumnDef],
        entity_name: &'static str,
        entity_prefix: &'static str,
    ) -> Self {
        Self {
            columns,
            entity_name,
            entity_prefix,
            show_summary: true,
        }
    }

    /// Drop the trailing "N found" line (quiet mode)
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.show_summary = !quiet;
        self
    }

    pub fn output<I>(&self, rows: I, format: OutputFormat) -> Result<()>
    where
        I: IntoIterator<Item = TableRow>,
    {
        let rows: Vec<TableRow> = rows.into_iter().collect();

        match format {
            OutputFormat::Csv => self.output_csv(&rows)?,
            OutputFormat::Md => self.output_md(&rows),
            OutputFormat::Id => rows.iter().for_each(|r| println!("{}", r.full_id)),
            OutputFormat::ShortId => rows.iter().for_each(|r| println!("{}", r.short_id)),
            _ => self.output_tsv(&rows),
        }
        Ok(())
    }

    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        let short_width = rows
            .iter()
            .map(|r| r.short_id.len())
            .max()
            .unwrap_or(5)
            .max(5);
        let mut widths = vec![short_width];

        for col in self.columns {
            let max_content = rows
                .iter()
                .filter_map(|r| r.get(col.key))
                .map(|v| v.display_width())
                .max()
                .unwrap_or(0);
            let natural = col.header.len().max(max_content.saturating_add(2));
            widths.push(natural.min(col.width));
        }

        widths
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let widths = self.calculate_widths(rows);

        let mut header = vec![format!(
            "{:<width$}",
            style("SHORT").bold().dim(),
            width = widths[0]
        )];
        for (col, width) in self.columns.iter().zip(&widths[1..]) {
            header.push(format!("{:<width$}", style(col.header).bold(), width = width));
        }
        println!("{}", header.join(" "));

        let total_width: usize = widths.iter().sum::<usize>() + widths.len() - 1;
        println!("{}", "-".repeat(total_width));

        for row in rows {
            let mut parts = vec![format!(
                "{:<width$}",
                style(&row.short_id).cyan(),
                width = widths[0]
            )];
            for (col, width) in self.columns.iter().zip(&widths[1..]) {
                match row.get(col.key) {
                    Some(value) => parts.push(value.format_tsv(*width)),
                    None => parts.push(format!("{:<width$}", "-", width = width)),
                }
            }
            println!("{}", parts.join(" "));
        }

        if self.show_summary {
            println!();
            println!(
                "{} {}(s) found. Use {} to reference by short ID.",
                style(rows.len()).cyan(),
                self.entity_name,
                style(format!("{}@N", self.entity_prefix)).cyan()
            );
        }
    }

    fn output_csv(&self, rows: &[TableRow]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(std::io::stdout());

        let mut headers = vec!["short_id", "id"];
        headers.extend(self.columns.iter().map(|c| c.key));
        writer.write_record(&headers).into_diagnostic()?;

        for row in rows {
            let mut record = vec![row.short_id.clone(), row.full_id.clone()];
            for col in self.columns {
                record.push(row.get(col.key).map(|v| v.raw()).unwrap_or_default());
            }
            writer.write_record(&record).into_diagnostic()?;
        }

        writer.flush().into_diagnostic()
    }

    fn output_md(&self, rows: &[TableRow]) {
        println!("{}", self.markdown(rows));
    }

    /// Render rows as a markdown table
    pub fn markdown(&self, rows: &[TableRow]) -> String {
        let mut builder = Builder::default();

        let mut headers = vec!["Short".to_string(), "ID".to_string()];
        headers.extend(self.columns.iter().map(|c| c.header.to_string()));
        builder.push_record(headers);

        for row in rows {
            let mut record = vec![row.short_id.clone(), row.full_id.clone()];
            for col in self.columns {
                record.push(
                    row.get(col.key)
                        .map(|v| v.format_md())
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
            builder.push_record(record);
        }

        builder.build().with(Style::markdown()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_text_format() {
        let cell = CellValue::Text("Hello World".to_string());
        assert!(cell.format_tsv(20).contains("Hello World"));
        assert_eq!(cell.raw(), "Hello World");
        assert_eq!(cell.format_md(), "Hello World");
    }

    #[test]
    fn test_cell_value_relation() {
        let cell = CellValue::Relation(RelationType::Investment);
        assert_eq!(cell.raw(), "investment");
    }

    #[test]
    fn test_cell_value_optional_date() {
        let none = CellValue::OptionalDate(None);
        assert_eq!(none.raw(), "");
        assert_eq!(none.format_md(), "-");

        let some = CellValue::OptionalDate(NaiveDate::from_ymd_opt(2020, 5, 1));
        assert_eq!(some.raw(), "2020-05-01");
    }

    #[test]
    fn test_cell_value_md_escapes_pipes() {
        let cell = CellValue::Text("A|B|>C".to_string());
        assert_eq!(cell.format_md(), "A\\|B\\|>C");
    }

    #[test]
    fn test_markdown_table() {
        const COLUMNS: &[ColumnDef] = &[ColumnDef::new("name", "NAME", 30)];
        let formatter = TableFormatter::new(COLUMNS, "company", "CO");
        let rows = vec![TableRow::new("CO-1", Some("CO@1".to_string()))
            .cell("name", CellValue::Name("Acme".to_string()))];
        let md = formatter.markdown(&rows);
        assert!(md.contains("| Short | ID"));
        assert!(md.contains("Acme"));
    }
}
