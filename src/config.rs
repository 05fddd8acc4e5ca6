use crate::address::ParserProfile;
use crate::error::ConfigError;
use crate::matching::cascade::CascadeConfig;
use crate::models::ColumnMapping;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SOURCE_A_LABEL: &str = "citywalls";
pub const DEFAULT_SOURCE_B_LABEL: &str = "opendata";

fn default_delimiter() -> char {
    ','
}

fn default_true() -> bool {
    true
}

/// Where one source lives and how its address columns are read.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct SourceConfig {
    /// Namespace suffix for this source's fields in the unified table.
    pub label: String,
    pub path: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// A missing file loads as an empty table instead of failing the run.
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub columns: ColumnMapping,
    #[serde(default)]
    pub parser: ParserProfile,
}

impl SourceConfig {
    pub fn source_a() -> Self {
        Self {
            label: DEFAULT_SOURCE_A_LABEL.into(),
            path: "citywalls_streets_data.csv".into(),
            delimiter: default_delimiter(),
            optional: false,
            columns: ColumnMapping::default(),
            parser: ParserProfile::default(),
        }
    }

    pub fn source_b() -> Self {
        Self {
            label: DEFAULT_SOURCE_B_LABEL.into(),
            path: "технико-экономические_паспорта_многоквартирных_домов.csv".into(),
            delimiter: default_delimiter(),
            optional: false,
            columns: ColumnMapping::default(),
            parser: ParserProfile::open_data(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ExportConfig {
    pub out_path: String,
    pub format: String, // csv|xlsx|both
    #[serde(default = "default_true")]
    pub source_a_json: bool,
    pub summary_path: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_path: "combined_buildings_data.csv".into(),
            format: "csv".into(),
            source_a_json: true,
            summary_path: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "SourceConfig::source_a")]
    pub source_a: SourceConfig,
    #[serde(default = "SourceConfig::source_b")]
    pub source_b: SourceConfig,
    #[serde(default)]
    pub matching: CascadeConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_a: SourceConfig::source_a(),
            source_b: SourceConfig::source_b(),
            matching: CascadeConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

fn validate_source(
    src: &SourceConfig,
    label_field: &'static str,
    path_field: &'static str,
    delimiter_field: &'static str,
) -> Result<(), ConfigError> {
    if src.label.trim().is_empty() {
        return Err(ConfigError::MissingField { field: label_field });
    }
    if src.path.trim().is_empty() {
        return Err(ConfigError::MissingField { field: path_field });
    }
    if !src.delimiter.is_ascii() {
        return Err(ConfigError::InvalidValue {
            field: delimiter_field,
            reason: format!("'{}' is not a single-byte delimiter", src.delimiter),
        });
    }
    src.parser.compile()?;
    Ok(())
}

impl AppConfig {
    pub fn from_json_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidValue {
            field: "config",
            reason: format!("{}: {}", path, e),
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidValue {
            field: "config",
            reason: format!("{}: {}", path, e),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_source(
            &self.source_a,
            "source_a.label",
            "source_a.path",
            "source_a.delimiter",
        )?;
        validate_source(
            &self.source_b,
            "source_b.label",
            "source_b.path",
            "source_b.delimiter",
        )?;
        if self.source_a.label.trim() == self.source_b.label.trim() {
            return Err(ConfigError::InvalidValue {
                field: "source_b.label",
                reason: format!(
                    "'{}' is also the label of source_a; field namespaces would collide",
                    self.source_b.label
                ),
            });
        }
        if self.export.out_path.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "export.out_path",
            });
        }
        match self.export.format.as_str() {
            "csv" | "xlsx" | "both" => {}
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "export.format",
                    reason: format!("unsupported: {}", other),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressFallback;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.source_a.label, "citywalls");
        assert_eq!(cfg.source_b.parser.fallback, AddressFallback::AnyMissing);
        assert!(cfg.source_a.parser.prefix_patterns.is_empty());
        assert!(cfg.matching.parallel);
        assert!(!cfg.matching.skip_blank_street_house);
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = AppConfig::default();
        cfg.export.format = "parquet".into();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue {
                field: "export.format",
                ..
            })
        ));

        let mut cfg = AppConfig::default();
        cfg.source_b.label = "citywalls".into();
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.source_a.path = " ".into();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingField {
                field: "source_a.path"
            })
        ));

        let mut cfg = AppConfig::default();
        cfg.source_b.parser.prefix_patterns = vec!["(unclosed".into()];
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue {
                field: "parser.prefix_patterns",
                ..
            })
        ));

        let mut cfg = AppConfig::default();
        cfg.source_a.delimiter = '→';
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{
            "source_b": { "label": "passports", "path": "b.csv", "delimiter": ";" },
            "matching": { "skip_blank_street_house": true },
            "export": { "out_path": "out.xlsx", "format": "xlsx" }
        }"#;
        let cfg: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.source_a.label, "citywalls");
        assert_eq!(cfg.source_b.delimiter, ';');
        assert_eq!(cfg.source_b.columns.street.as_deref(), Some("Улица"));
        assert!(cfg.matching.parallel);
        assert!(cfg.matching.skip_blank_street_house);
        assert!(cfg.export.source_a_json);
        cfg.validate().unwrap();
    }
}
