//! Writers for the output document.
//!
//! This module provides:
//! - A pretty-printed JSON dump of the document
//! - Template substitution into an HTML page (`{{TITLE}}`, `{{INLINE_JSON}}`)

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::document::Output;

/// Placeholder replaced with the HTML-escaped title.
pub const TITLE_PLACEHOLDER: &str = "{{TITLE}}";

/// Placeholder replaced with the pretty-printed JSON document.
pub const JSON_PLACEHOLDER: &str = "{{INLINE_JSON}}";

/// Page used when no template file is supplied.
pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{TITLE}}</title>
</head>
<body>
<h1>{{TITLE}}</h1>
<script id="grovegrid-data" type="application/json">
{{INLINE_JSON}}
</script>
</body>
</html>
"#;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read the page template.
    #[error("failed to read template '{path}': {source}")]
    ReadTemplate {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding error.
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Write `contents` to `path`, creating parent directories as needed.
fn write_file(path: &Path, contents: &str) -> Result<()> {
    ensure_parent_dirs(path)?;

    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    writer
        .write_all(contents.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|e| WriteError::WriteFile {
            path: path.display().to_string(),
            source: e,
        })
}

/// Escape the characters that matter inside HTML text and attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Encode the document as pretty-printed JSON.
pub fn to_json(output: &Output) -> Result<String> {
    Ok(serde_json::to_string_pretty(output)?)
}

/// Substitute the title and document into a page template.
pub fn render_template(template: &str, output: &Output) -> Result<String> {
    let json = to_json(output)?;
    Ok(template
        .replace(TITLE_PLACEHOLDER, &escape_html(&output.meta.title))
        .replace(JSON_PLACEHOLDER, &json))
}

/// Read a template file, or fall back to [`DEFAULT_TEMPLATE`].
pub fn load_template(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|e| WriteError::ReadTemplate {
            path: path.display().to_string(),
            source: e,
        }),
        None => Ok(DEFAULT_TEMPLATE.to_string()),
    }
}

/// Write the raw JSON dump of the document.
///
/// # Errors
///
/// Returns an error if:
/// - Parent directories cannot be created
/// - File cannot be created or written to
pub fn write_json(path: &Path, output: &Output) -> Result<()> {
    write_file(path, &to_json(output)?)
}

/// Render the document into `<out_dir>/index.html` and return that path.
pub fn write_page(out_dir: &Path, template: &str, output: &Output) -> Result<PathBuf> {
    let path = out_dir.join("index.html");
    write_file(&path, &render_template(template, output)?)?;
    Ok(path)
}
