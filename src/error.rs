use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Structural failures while loading a source table. Every variant names the source
/// so a failed run says which input was unusable.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to load source '{source_label}' from {path}: {reason}")]
    SourceLoad {
        source_label: String,
        path: String,
        reason: String,
    },
    #[error("source '{source_label}' has no header row")]
    MissingHeader { source_label: String },
    #[error("source '{source_label}' is malformed at line {line}: {reason}")]
    Malformed {
        source_label: String,
        line: u64,
        reason: String,
    },
}

impl InputError {
    pub fn source_label(&self) -> &str {
        match self {
            Self::SourceLoad { source_label, .. }
            | Self::MissingHeader { source_label }
            | Self::Malformed { source_label, .. } => source_label,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export error: {0}")]
    Csv(String),
    #[error("xlsx export error: {0}")]
    Xlsx(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Self::Xlsx(e.to_string())
    }
}
