//! Output formatting: JSON, compact JSON, YAML, plain.
//!
//! Structured results render in the format selected by the `output` setting;
//! raw downloads (exports, xml/xls/csv forms) go to stdout byte for byte.

use std::io::{self, Write};

use bytes::Bytes;
use serde_json::Value;

use onapie_config::OutputFormat;

use crate::error::CliError;

/// The result of one operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Json(Value),
    Bytes(Bytes),
    Empty,
}

/// Render a structured result. `null` renders as nothing.
pub fn render(value: &Value, format: OutputFormat) -> Result<String, CliError> {
    if value.is_null() {
        return Ok(String::new());
    }
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).map_err(render_error),
        OutputFormat::JsonCompact => serde_json::to_string(value).map_err(render_error),
        OutputFormat::Yaml => serde_yaml::to_string(value)
            .map(|yaml| yaml.trim_end().to_owned())
            .map_err(render_error),
        OutputFormat::Plain => Ok(render_plain(value)),
    }
}

fn render_error(err: impl std::fmt::Display) -> CliError {
    CliError::Render {
        message: err.to_string(),
    }
}

/// Strings unquoted, scalars bare, one array element or `key\tvalue` pair
/// per line.
fn render_plain(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(plain_scalar).collect::<Vec<_>>().join("\n"),
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("{key}\t{}", plain_scalar(value)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => plain_scalar(other),
    }
}

fn plain_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Write an operation result to stdout, respecting quiet mode.
pub fn print_output(output: &Output, format: OutputFormat, quiet: bool) -> Result<(), CliError> {
    if quiet {
        return Ok(());
    }
    let mut stdout = io::stdout().lock();
    match output {
        Output::Json(value) => {
            let rendered = render(value, format)?;
            if !rendered.is_empty() {
                writeln!(stdout, "{rendered}")?;
            }
        }
        Output::Bytes(body) => stdout.write_all(body)?,
        Output::Empty => {}
    }
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_object_renders_as_braces() {
        assert_eq!(render(&json!({}), OutputFormat::Json).unwrap(), "{}");
    }

    #[test]
    fn null_renders_nothing() {
        for format in [OutputFormat::Json, OutputFormat::Yaml, OutputFormat::Plain] {
            assert_eq!(render(&Value::Null, format).unwrap(), "");
        }
    }

    #[test]
    fn compact_and_pretty_json() {
        let value = json!({"formid": 1, "title": "Tutorial"});
        assert_eq!(
            render(&value, OutputFormat::JsonCompact).unwrap(),
            r#"{"formid":1,"title":"Tutorial"}"#
        );
        assert!(render(&value, OutputFormat::Json).unwrap().contains("\n  \"formid\": 1"));
    }

    #[test]
    fn yaml_has_no_trailing_newline() {
        assert_eq!(
            render(&json!({"formid": 1}), OutputFormat::Yaml).unwrap(),
            "formid: 1"
        );
    }

    #[test]
    fn plain_lists_and_maps() {
        assert_eq!(
            render(&json!(["a", 2, {"x": 1}]), OutputFormat::Plain).unwrap(),
            "a\n2\n{\"x\":1}"
        );
        assert_eq!(
            render(&json!({"enketo_url": "https://e/x", "n": 3}), OutputFormat::Plain).unwrap(),
            "enketo_url\thttps://e/x\nn\t3"
        );
        assert_eq!(render(&json!("bare"), OutputFormat::Plain).unwrap(), "bare");
    }
}
