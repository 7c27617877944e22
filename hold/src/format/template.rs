//! Output templates for `images --format`.
//!
//! A template is text with `{{.Field}}` placeholders. The two characters
//! `\t` stand for a tab, and a leading `table` keyword lays the output out
//! as an aligned table, tab-separated parts becoming columns.

use libhold::config::Headers;
use libhold::{Column, DisplayRow, HoldError, Result};

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field { column: Column, or_none: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    table: bool,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses a user supplied template.
    ///
    /// Unknown fields and unterminated placeholders are usage errors.
    pub fn parse(source: &str) -> Result<Self> {
        let source = source.replace("\\t", "\t");
        let (table, body) = match source.strip_prefix("table") {
            Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
                (true, rest.trim_start())
            }
            _ => (false, source.as_str()),
        };

        let mut segments = Vec::new();
        let mut rest = body;
        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| {
                HoldError::usage(format!("unterminated placeholder in template {:?}", source))
            })?;
            let action = after[..end].trim();
            let name = action.strip_prefix('.').ok_or_else(|| {
                HoldError::usage(format!("unsupported template action {:?}", action))
            })?;
            segments.push(Segment::Field {
                column: name.parse()?,
                or_none: false,
            });
            rest = &after[end + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { table, segments })
    }

    /// The default listing table: name, tag, optional digest, ID, age and
    /// size, with a read-only column when asked for.
    pub fn default_table(digests: bool, read_only: bool) -> Self {
        let mut columns = vec![Column::Name, Column::Tag];
        if digests {
            columns.push(Column::Digest);
        }
        columns.extend([Column::Id, Column::CreatedAt, Column::Size]);
        if read_only {
            columns.push(Column::ReadOnly);
        }

        let mut segments = Vec::new();
        for (i, column) in columns.into_iter().enumerate() {
            if i > 0 {
                segments.push(Segment::Literal("\t".to_string()));
            }
            segments.push(Segment::Field {
                column,
                or_none: true,
            });
        }
        Self {
            table: true,
            segments,
        }
    }

    /// One image ID per line.
    pub fn quiet() -> Self {
        Self {
            table: false,
            segments: vec![Segment::Field {
                column: Column::Id,
                or_none: false,
            }],
        }
    }

    pub fn is_table(&self) -> bool {
        self.table
    }

    pub fn render_row(&self, row: &DisplayRow) -> String {
        self.render_with(|column, or_none| {
            if or_none {
                row.cell(column)
            } else {
                row.field(column)
            }
        })
    }

    /// Renders the template with every field replaced by its header.
    pub fn render_header(&self, headers: &Headers) -> String {
        self.render_with(|column, _| headers.header(column).to_string())
    }

    fn render_with<F: Fn(Column, bool) -> String>(&self, value: F) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Field { column, or_none } => value(*column, *or_none),
            })
            .collect()
    }
}
