#![deny(clippy::all, clippy::pedantic)]

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::client::CliError;

/// Merge an optional JSON object file with `key=value` entries; entries win.
pub fn workflow_info(
    entries: &[String],
    file: Option<&Path>,
) -> Result<Map<String, Value>, CliError> {
    let mut info = match file {
        Some(path) => {
            let data = fs::read_to_string(path).map_err(|source| CliError::InputFile {
                path: path.display().to_string(),
                source,
            })?;
            match serde_json::from_str::<Value>(&data)
                .map_err(|e| CliError::InvalidInput(format!("{}: {e}", path.display())))?
            {
                Value::Object(map) => map,
                _ => {
                    return Err(CliError::InvalidInput(format!(
                        "{} must contain a JSON object",
                        path.display()
                    )));
                }
            }
        }
        None => Map::new(),
    };

    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| CliError::InvalidInput(format!("expected KEY=VALUE, got `{entry}`")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::InvalidInput(format!(
                "workflow key must not be empty in `{entry}`"
            )));
        }
        info.insert(key.to_string(), Value::String(value.to_string()));
    }

    Ok(info)
}
