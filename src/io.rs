use std::path::Path;

use serde_json::Value;

use crate::compiler::registry::SlotMap;

/// The main source template which is used when none is given on the
/// command line.
pub const MAIN_TEMPLATE: &str = include_str!("../templates/main_template.cpp");

/// The formats an input document can be written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Determines the format of a document from the extension of its file.
    pub fn from_path(path: &Path) -> Option<DocumentFormat> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(DocumentFormat::Json),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum ReadError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    UnknownFormat(String),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ReadError::*;
        match self {
            Io(e) => write!(f, "{}", e),
            Json(e) => write!(f, "Invalid JSON: {}", e),
            Yaml(e) => write!(f, "Invalid YAML: {}", e),
            UnknownFormat(path) => write!(
                f,
                "Cannot determine the format of {}, expected extension json, yaml or yml",
                path
            ),
        }
    }
}

impl std::error::Error for ReadError {}

impl From<std::io::Error> for ReadError {
    fn from(e: std::io::Error) -> Self {
        ReadError::Io(e)
    }
}

/// Parses the text of a document. A YAML document is read into the same
/// value model as a JSON one.
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Value, ReadError> {
    match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(ReadError::Json),
        DocumentFormat::Yaml => serde_yaml::from_str::<Value>(text).map_err(ReadError::Yaml),
    }
}

pub fn read_document(path: &Path) -> Result<Value, ReadError> {
    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| ReadError::UnknownFormat(path.display().to_string()))?;
    let text = std::fs::read_to_string(path)?;
    parse_document(&text, format)
}

/// Reads the template at `path`, or returns the bundled template.
pub fn read_template(path: Option<&Path>) -> Result<String, std::io::Error> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => Ok(MAIN_TEMPLATE.into()),
    }
}

pub fn write_output(path: &Path, text: &str) -> Result<(), std::io::Error> {
    std::fs::write(path, text)
}

/// Writes the slot map as a YAML mapping from slot name to slot text.
pub fn write_slots(file: &mut std::fs::File, slots: &SlotMap) -> Result<(), serde_yaml::Error> {
    serde_yaml::to_writer(file, slots)
}
