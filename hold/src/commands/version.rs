use libhold::storage::{DEFAULT_DRIVER, DEFAULT_GRAPH_ROOT};

/// Key/value pairs reported by `hold version`.
pub fn version_fields() -> Vec<(&'static str, String)> {
    vec![
        ("Version", env!("CARGO_PKG_VERSION").to_string()),
        ("Library Version", libhold::version().to_string()),
        ("Default Driver", DEFAULT_DRIVER.to_string()),
        ("Default Root", DEFAULT_GRAPH_ROOT.to_string()),
    ]
}

/// Renders fields as `Key: value` lines with the values aligned.
pub fn render_fields(fields: &[(&str, String)]) -> String {
    let width = fields.iter().map(|(key, _)| key.len() + 1).max().unwrap_or(0);
    fields
        .iter()
        .map(|(key, value)| format!("{:<width$} {}\n", format!("{}:", key), value, width = width))
        .collect()
}

pub fn print_version() {
    print!("{}", render_fields(&version_fields()));
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
