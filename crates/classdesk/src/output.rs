//! Output formatting.
//!
//! Resource payloads are opaque JSON, so every format is a JSON rendering.

use std::io::{self, Write};

use crate::cli::OutputFormat;

/// Render a value in the chosen format.
pub fn render<T: serde::Serialize + ?Sized>(format: &OutputFormat, data: &T) -> String {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(data),
        OutputFormat::JsonCompact => serde_json::to_string(data),
    };
    rendered.unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn compact_is_single_line() {
        let value = json!({"a": [1, 2]});
        assert_eq!(render(&OutputFormat::JsonCompact, &value), r#"{"a":[1,2]}"#);
        assert!(render(&OutputFormat::Json, &value).contains('\n'));
    }
}
