use crate::config::AppConfig;
use crate::error::ConfigError;
use clap::{Parser, ValueEnum};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, ValueEnum, Debug)]
pub enum FormatOpt {
    Csv,
    Xlsx,
    Both,
}

impl FormatOpt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Both => "both",
        }
    }
}
impl std::fmt::Display for FormatOpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "building_linker",
    version,
    about = "Link building records from two address sources into one table",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// JSON configuration file; flags below override its values
    #[arg(long, value_name = "FILE", env = "BUILDING_LINKER_CONFIG")]
    pub config: Option<String>,
    /// Source A table (structured street/house columns)
    #[arg(long = "source-a", value_name = "PATH", env = "BUILDING_LINKER_SOURCE_A")]
    pub source_a: Option<String>,
    /// Source B table (free-text address column)
    #[arg(long = "source-b", value_name = "PATH", env = "BUILDING_LINKER_SOURCE_B")]
    pub source_b: Option<String>,
    /// Output path
    #[arg(long = "out", value_name = "OUT_PATH", env = "BUILDING_LINKER_OUT")]
    pub out_path: Option<String>,
    /// Output format
    #[arg(long, value_name = "FORMAT", env = "BUILDING_LINKER_FORMAT")]
    pub format: Option<FormatOpt>,
    /// Also write the run summary as Key/Value CSV
    #[arg(long, value_name = "PATH", env = "BUILDING_LINKER_SUMMARY")]
    pub summary: Option<String>,
    /// Run every pass on a single thread
    #[arg(long = "no-parallel", env = "BUILDING_LINKER_NO_PARALLEL")]
    pub no_parallel: bool,
    /// Omit the source_a_json column contents
    #[arg(long = "no-source-a-json", env = "BUILDING_LINKER_NO_SOURCE_A_JSON")]
    pub no_source_a_json: bool,
    /// Keep records with an empty street or house key out of every pass
    #[arg(
        long = "skip-blank-street-house",
        env = "BUILDING_LINKER_SKIP_BLANK_STREET_HOUSE"
    )]
    pub skip_blank_street_house: bool,
}

impl Cli {
    pub fn to_app_config(&self) -> Result<AppConfig, ConfigError> {
        let mut cfg = match self.config.as_deref() {
            Some(path) => AppConfig::from_json_file(path)?,
            None => AppConfig::default(),
        };
        if let Some(p) = &self.source_a {
            cfg.source_a.path = p.clone();
        }
        if let Some(p) = &self.source_b {
            cfg.source_b.path = p.clone();
        }
        if let Some(p) = &self.out_path {
            cfg.export.out_path = p.clone();
        }
        if let Some(f) = self.format {
            cfg.export.format = f.as_str().into();
        }
        if let Some(p) = &self.summary {
            cfg.export.summary_path = Some(p.clone());
        }
        if self.no_parallel {
            cfg.matching.parallel = false;
        }
        if self.no_source_a_json {
            cfg.export.source_a_json = false;
        }
        if self.skip_blank_street_house {
            cfg.matching.skip_blank_street_house = true;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "building_linker",
            "--source-a",
            "walls.csv",
            "--out",
            "out/combined.xlsx",
            "--format",
            "xlsx",
            "--no-parallel",
            "--skip-blank-street-house",
        ])
        .unwrap();
        let cfg = cli.to_app_config().unwrap();
        assert_eq!(cfg.source_a.path, "walls.csv");
        assert_eq!(cfg.source_b.label, "opendata");
        assert_eq!(cfg.export.format, "xlsx");
        assert!(!cfg.matching.parallel);
        assert!(cfg.matching.skip_blank_street_house);
        assert!(cfg.export.source_a_json);
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["building_linker", "--format", "parquet"]).is_err());
    }

    #[test]
    fn config_file_then_flags() {
        std::fs::create_dir_all("./target").unwrap();
        let path = "./target/test_cli_config.json";
        std::fs::write(
            path,
            r#"{ "source_a": { "label": "walls", "path": "from_file.csv" },
                 "export": { "out_path": "x.csv", "format": "csv" } }"#,
        )
        .unwrap();
        let cli = Cli::try_parse_from([
            "building_linker",
            "--config",
            path,
            "--no-source-a-json",
        ])
        .unwrap();
        let cfg = cli.to_app_config().unwrap();
        assert_eq!(cfg.source_a.label, "walls");
        assert_eq!(cfg.source_a.path, "from_file.csv");
        assert!(!cfg.export.source_a_json);
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let cli = Cli::try_parse_from(["building_linker", "--config", "./target/nope.json"])
            .unwrap();
        assert!(matches!(
            cli.to_app_config(),
            Err(ConfigError::InvalidValue { field: "config", .. })
        ));
    }
}
