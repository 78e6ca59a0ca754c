use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLS_MIME: &str = "application/vnd.ms-excel";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    SpreadsheetXlsx,
    SpreadsheetXls,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileHandle {
    pub name: String,
    pub size_bytes: u64,
    /// Declared MIME type. Native pickers never provide one; some drag-and-drop
    /// sources do.
    pub mime_type: Option<String>,
    pub path: PathBuf,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, size_bytes: u64, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            mime_type: None,
            path: path.into(),
        }
    }

    pub fn with_mime(mut self, mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        self.mime_type = if mime_type.is_empty() {
            None
        } else {
            Some(mime_type)
        };
        self
    }

    /// Builds a handle from a file on disk, reading its size from metadata.
    pub fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let size_bytes = std::fs::metadata(&path)?.len();
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Ok(Self::new(name, size_bytes, path))
    }

    pub fn kind(&self) -> FileKind {
        match self.mime_type.as_deref() {
            Some(XLSX_MIME) => FileKind::SpreadsheetXlsx,
            Some(XLS_MIME) => FileKind::SpreadsheetXls,
            _ if self.name.ends_with(".xlsx") => FileKind::SpreadsheetXlsx,
            _ if self.name.ends_with(".xls") => FileKind::SpreadsheetXls,
            _ => FileKind::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    DetectErrors,
    DetectDuplicates,
}

impl Action {
    pub const ALL: [Action; 2] = [Action::DetectErrors, Action::DetectDuplicates];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::DetectErrors => "detect_errors",
            Action::DetectDuplicates => "detect_duplicates",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::DetectErrors => "Détection des erreurs",
            Action::DetectDuplicates => "Détection des doublons",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorRecord {
    #[serde(rename = "Ligne", alias = "Line")]
    pub line: u64,
    #[serde(rename = "Colonne", alias = "Column")]
    pub column: String,
    #[serde(
        rename = "Valeur",
        alias = "Value",
        default,
        deserialize_with = "optional_cell_text"
    )]
    pub value: Option<String>,
    #[serde(rename = "Problème", alias = "Problem")]
    pub problem: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DuplicateRecord {
    #[serde(rename = "Ligne", alias = "Line")]
    pub line: u64,
    #[serde(
        rename = "Identifiant",
        alias = "Identifier",
        deserialize_with = "cell_text"
    )]
    pub identifier: String,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    ErrorReport { errors: Vec<ErrorRecord> },
    DuplicateReport { duplicates: Vec<DuplicateRecord> },
    Empty { message: String },
}

/// Opaque reference to the processed workbook held by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    #[cfg(test)]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResponse {
    pub result: AnalysisResult,
    pub artifact: Option<ArtifactRef>,
}

/// Raw `/process` reply as the service sends it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeReply {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Option<Value>,
    #[serde(default)]
    pub file: Option<ArtifactRef>,
}

/// Raw `/get_sheets` reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SheetsReply {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub sheets: Vec<String>,
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        other => Some(other.to_string()),
    }
}

fn optional_cell_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(Value::deserialize(deserializer)?))
}

fn cell_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(Value::deserialize(deserializer)?).unwrap_or_default())
}
