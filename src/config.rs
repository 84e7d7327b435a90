//! Configuration management for the OME validator CLI.
//!
//! Options come from command-line arguments via clap, with environment
//! variable fallbacks under the `OME_` prefix.
//!
//! # Environment Variables
//!
//! - `OME_SCHEMA` - Path to an alternative XSD schema file
//! - `OME_LOG` - Log filter in tracing `EnvFilter` syntax (default: warn)

use std::path::PathBuf;

use clap::Parser;

/// Default log filter when neither --log-filter nor OME_LOG is set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// OME Validator - schema validation for OME-XML microscopy metadata.
///
/// Validates standalone OME-XML files and OME-TIFF containers (where the
/// metadata lives in the TIFF ImageDescription tag) against the OME schema.
#[derive(Parser, Debug, Clone)]
#[command(name = "ome-validator")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Files to validate. `.tif`/`.tiff` paths are treated as TIFF
    /// containers, everything else as standalone XML.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Path to an alternative XSD schema file.
    ///
    /// If not specified, the bundled OME 2016-06 schema is used.
    #[arg(long, env = "OME_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Print the full report for each file, including the extracted
    /// metadata for OME-TIFFs.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Emit reports as JSON on stdout instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Log filter in tracing EnvFilter syntax.
    #[arg(long, default_value = DEFAULT_LOG_FILTER, env = "OME_LOG")]
    pub log_filter: String,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.files.is_empty() {
            return Err("at least one file to validate is required".to_string());
        }

        if let Some(schema) = &self.schema {
            if !schema.is_file() {
                return Err(format!(
                    "schema file does not exist: {}",
                    schema.display()
                ));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            files: vec![PathBuf::from("sample.ome.tiff")],
            schema: None,
            verbose: false,
            json: false,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_no_files() {
        let mut config = test_config();
        config.files.clear();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("at least one"));
    }

    #[test]
    fn test_missing_schema_file() {
        let mut config = test_config();
        config.schema = Some(PathBuf::from("/nonexistent/schema.xsd"));

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("schema"));
    }

    #[test]
    fn test_existing_schema_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<xsd:schema/>").unwrap();

        let mut config = test_config();
        config.schema = Some(file.path().to_path_buf());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_parsing() {
        let config = Config::try_parse_from([
            "ome-validator",
            "--verbose",
            "--json",
            "a.ome.xml",
            "b.tiff",
        ])
        .unwrap();
        assert!(config.verbose);
        assert!(config.json);
        assert_eq!(config.files.len(), 2);
    }

    #[test]
    fn test_cli_requires_files() {
        let result = Config::try_parse_from(["ome-validator"]);
        assert!(result.is_err());
    }
}
