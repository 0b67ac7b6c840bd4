use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use std::path::Path;

/// Overwrites `name` and `version` in the `package.json` at `path`.
///
/// # Errors
///
/// Returns an [`Err`] if the file cannot be read, is not a JSON object, or
/// cannot be written back.
pub fn rewrite(path: &Path, name: &str, version: &str) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;

    let rewritten = rewrite_str(&contents, name, version)
        .with_context(|| format!("Failed to update manifest {}", path.display()))?;

    std::fs::write(path, rewritten)
        .with_context(|| format!("Failed to write manifest {}", path.display()))
}

/// Same as [`rewrite`] on an in-memory document. Key order, indentation,
/// line endings and the trailing newline of `contents` are kept.
///
/// # Errors
///
/// Returns an [`Err`] if `contents` is not a JSON object.
pub fn rewrite_str(contents: &str, name: &str, version: &str) -> Result<String> {
    let mut manifest: Value = serde_json::from_str(contents).context("Invalid JSON")?;

    let Some(fields) = manifest.as_object_mut() else {
        bail!("Manifest is not a JSON object");
    };

    fields.insert("name".to_string(), Value::String(name.to_string()));
    fields.insert("version".to_string(), Value::String(version.to_string()));

    let mut out = match detect_indent(contents) {
        Some(indent) => {
            let mut buf = Vec::with_capacity(contents.len());
            let mut ser =
                Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent.as_bytes()));
            manifest.serialize(&mut ser)?;
            String::from_utf8(buf)?
        }
        None => serde_json::to_string(&manifest)?,
    };

    if contents.ends_with('\n') {
        out.push('\n');
    }

    // Serialized JSON never holds a raw newline inside a string.
    if contents.contains("\r\n") {
        out = out.replace('\n', "\r\n");
    }

    Ok(out)
}

/// Leading whitespace of the first indented line, or `None` for a document
/// written on a single line.
fn detect_indent(contents: &str) -> Option<&str> {
    contents.lines().skip(1).find_map(|line| {
        let trimmed = line.trim_start_matches([' ', '\t']);
        let indent = &line[..line.len() - trimmed.len()];
        (!indent.is_empty() && !trimmed.is_empty()).then_some(indent)
    })
}
