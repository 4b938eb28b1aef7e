//! Offline mapping of a recorded IDX response.

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use idx_remediation::{FieldDescriptor, RemediationMapper, Response};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::debug;

#[derive(Serialize)]
struct FieldsView {
    step: String,
    fields: Vec<FieldDescriptor>,
}

impl fmt::Display for FieldsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step: {}", self.step)?;
        for field in &self.fields {
            write_field(f, field, 1)?;
        }
        Ok(())
    }
}

fn write_field(f: &mut fmt::Formatter<'_>, field: &FieldDescriptor, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    match field {
        FieldDescriptor::Text(text) => {
            let mut flags = Vec::new();
            if text.required {
                flags.push("required");
            }
            if text.secure {
                flags.push("secure");
            }
            write!(f, "\n{}[text] {}", indent, text.label)?;
            if !flags.is_empty() {
                write!(f, " ({})", flags.join(", "))?;
            }
            if !text.value.is_empty() && !text.secure {
                write!(f, " = {}", text.value)?;
            }
            if let Some(message) = &text.error_message {
                write!(f, " ! {}", message)?;
            }
        }
        FieldDescriptor::Options(group) => {
            write!(
                f,
                "\n{}[options] {}",
                indent,
                group.label.as_deref().unwrap_or_default()
            )?;
            if let Some(message) = &group.error_message {
                write!(f, " ! {}", message.replace('\n', "; "))?;
            }
            for option in &group.options {
                let marker = if group.selected == Some(option.index) {
                    "*"
                } else {
                    "-"
                };
                write!(
                    f,
                    "\n{}  {} {}",
                    indent,
                    marker,
                    option.label.as_deref().unwrap_or_default()
                )?;
                for nested in &option.fields {
                    write_field(f, nested, depth + 2)?;
                }
            }
        }
        FieldDescriptor::Action(action) => {
            write!(
                f,
                "\n{}[action] {} -> {} #{}",
                indent, action.label, action.target.step_type, action.target.step
            )?;
        }
        FieldDescriptor::Image(image) => {
            write!(
                f,
                "\n{}[image] {} ({} bytes)",
                indent,
                image.label,
                image.image_bytes.len()
            )?;
        }
    }
    Ok(())
}

/// Load a recorded response and print the descriptors for one of its steps.
pub fn fields(path: &Path, step: usize, include_skip: bool, format: &OutputFormat) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let response: Response = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse response from {}", path.display()))?;

    let Some(remediation) = response.remediations.get(step) else {
        anyhow::bail!(
            "Response has {} remediation(s); no step at index {}",
            response.remediations.len(),
            step
        );
    };
    debug!(step = %remediation.step_type, include_skip, "Mapping recorded response");

    let view = FieldsView {
        step: remediation.step_type.to_string(),
        fields: RemediationMapper::new().map_step(&response, step, include_skip),
    };
    output::print(&view, format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const IDENTIFY_RESPONSE: &str = r#"{
        "remediations": [{
            "type": "identify",
            "form": { "fields": [
                { "name": "identifier", "label": "Username", "required": true },
                { "name": "credentials", "form": { "fields": [
                    { "name": "passcode", "label": "Password", "secret": true }
                ]}}
            ]}
        }]
    }"#;

    #[test]
    fn test_fields_view_renders_text() {
        let response: Response = serde_json::from_str(IDENTIFY_RESPONSE).unwrap();
        let view = FieldsView {
            step: "identify".to_string(),
            fields: RemediationMapper::new().map_step(&response, 0, false),
        };

        let text = view.to_string();
        assert!(text.starts_with("Step: identify"));
        assert!(text.contains("[text] Username (required)"));
        assert!(text.contains("[text] Password (secure)"));
        assert!(text.contains("[action] Continue -> identify #0"));
    }

    #[test]
    fn test_fields_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(IDENTIFY_RESPONSE.as_bytes()).unwrap();

        assert!(fields(file.path(), 0, false, &OutputFormat::Json).is_ok());
        assert!(fields(file.path(), 3, false, &OutputFormat::Text).is_err());
    }

    #[test]
    fn test_fields_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let err = fields(file.path(), 0, false, &OutputFormat::Text).unwrap_err();
        assert!(err.to_string().contains("Failed to parse response"));
    }
}
