//! Rendering of image listings.

use crate::format::Template;
use libhold::config::Headers;
use libhold::{DisplayRow, HoldError, ImageSummary, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tabled::builder::Builder;
use tabled::settings::{Padding, Style};

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;

/// Turns listing results into printable text.
pub trait Renderer {
    /// Renders rows through a template. `heading` controls the header row of
    /// table templates.
    fn render_table(
        &self,
        rows: &[DisplayRow],
        template: &Template,
        headers: &Headers,
        heading: bool,
    ) -> String;

    /// Renders image summaries as a JSON array indented by four spaces.
    fn render_json(&self, images: &[ImageSummary]) -> Result<String>;
}

/// Renderer producing `tabled` tables and `serde_json` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabledRenderer {
    /// Print headers in bold
    pub color: bool,
}

impl TabledRenderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn header_cell(&self, header: &str) -> String {
        if self.color && !header.is_empty() {
            header.bold().to_string()
        } else {
            header.to_string()
        }
    }
}

fn cells(line: &str) -> Vec<String> {
    line.split('\t').map(str::to_string).collect()
}

impl Renderer for TabledRenderer {
    fn render_table(
        &self,
        rows: &[DisplayRow],
        template: &Template,
        headers: &Headers,
        heading: bool,
    ) -> String {
        if !template.is_table() {
            return rows
                .iter()
                .map(|row| format!("{}\n", template.render_row(row)))
                .collect();
        }

        let mut builder = Builder::default();
        let mut records = 0;
        if heading {
            let header = template.render_header(headers);
            builder.push_record(header.split('\t').map(|h| self.header_cell(h)));
            records += 1;
        }
        for row in rows {
            builder.push_record(cells(&template.render_row(row)));
            records += 1;
        }
        if records == 0 {
            return String::new();
        }

        let mut table = builder.build();
        table.with(Style::empty()).with(Padding::new(0, 3, 0, 0));

        let mut output = table
            .to_string()
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");
        output.push('\n');
        output
    }

    fn render_json(&self, images: &[ImageSummary]) -> Result<String> {
        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        images.serialize(&mut serializer).map_err(|e| {
            HoldError::validation_with_source("Failed to serialize images to JSON", e)
        })?;
        let mut json = String::from_utf8(buf)
            .map_err(|e| HoldError::validation_with_source("Serialized JSON is not UTF-8", e))?;
        json.push('\n');
        Ok(json)
    }
}
