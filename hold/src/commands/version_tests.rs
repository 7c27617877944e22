use super::*;

#[test]
fn test_version_fields() {
    let fields = version_fields();
    assert_eq!(fields[0], ("Version", env!("CARGO_PKG_VERSION").to_string()));
    assert_eq!(fields[1], ("Library Version", libhold::version().to_string()));
    assert!(fields.iter().any(|(key, value)| *key == "Default Driver" && value == "overlay"));
}

#[test]
fn test_render_fields_aligns_values() {
    let output = render_fields(&[
        ("Version", "1.2.3".to_string()),
        ("Default Driver", "vfs".to_string()),
    ]);
    assert_eq!(output, "Version:        1.2.3\nDefault Driver: vfs\n");
}

#[test]
fn test_render_fields_empty() {
    assert_eq!(render_fields(&[]), "");
}
