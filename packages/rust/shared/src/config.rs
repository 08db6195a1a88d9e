//! Application configuration for coursegeo.
//!
//! User config lives at `~/.coursegeo/coursegeo.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CourseGeoError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "coursegeo.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".coursegeo";

/// Default Nominatim endpoint.
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Public TCAS course list.
const DEFAULT_COURSES_URL: &str =
    "https://my-tcas.s3.ap-southeast-1.amazonaws.com/mytcas/courses.json";

// ---------------------------------------------------------------------------
// Config structs (matching coursegeo.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Dataset paths and query defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Geocoding provider settings.
    #[serde(default)]
    pub geocoder: GeocoderConfig,

    /// Course list source.
    #[serde(default)]
    pub source: SourceConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Dataset to enrich (CSV or spreadsheet).
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Comma-delimited output path.
    #[serde(default = "default_csv_output")]
    pub csv_output: PathBuf,

    /// Spreadsheet output path.
    #[serde(default = "default_xlsx_output")]
    pub xlsx_output: PathBuf,

    /// Column holding the institution name used as the geocoding key.
    #[serde(default = "default_name_column")]
    pub name_column: String,

    /// Locality appended to every query to disambiguate short names.
    #[serde(default = "default_country_hint")]
    pub country_hint: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            csv_output: default_csv_output(),
            xlsx_output: default_xlsx_output(),
            name_column: default_name_column(),
            country_hint: default_country_hint(),
        }
    }
}

fn default_input() -> PathBuf {
    "data/filtered_ai_com_courses.xlsx".into()
}
fn default_csv_output() -> PathBuf {
    "data/filtered_ai_com_courses.csv".into()
}
fn default_xlsx_output() -> PathBuf {
    "data/filtered_ai_com_courses.xlsx".into()
}
fn default_name_column() -> String {
    "university_name_th".into()
}
fn default_country_hint() -> String {
    "Thailand".into()
}

/// `[geocoder]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Base URL of a Nominatim-compatible service.
    #[serde(default = "default_geocoder_url")]
    pub base_url: Url,

    /// User-Agent sent with every request (required by Nominatim's usage policy).
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause after every query, in milliseconds.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Matches scoring below this importance are treated as unresolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_importance: Option<f64>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            rate_limit_ms: default_rate_limit_ms(),
            min_importance: None,
        }
    }
}

impl GeocoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_geocoder_url() -> Url {
    Url::parse(DEFAULT_GEOCODER_URL).expect("default geocoder URL is valid")
}
fn default_user_agent() -> String {
    concat!("coursegeo/", env!("CARGO_PKG_VERSION")).into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_rate_limit_ms() -> u64 {
    1000
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// JSON endpoint serving the course list.
    #[serde(default = "default_courses_url")]
    pub courses_url: Url,

    /// Spreadsheet the fetched course list is saved to.
    #[serde(default = "default_courses_output")]
    pub output: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            courses_url: default_courses_url(),
            output: default_courses_output(),
        }
    }
}

fn default_courses_url() -> Url {
    Url::parse(DEFAULT_COURSES_URL).expect("default courses URL is valid")
}
fn default_courses_output() -> PathBuf {
    "data/courses.xlsx".into()
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// The pair of files every run writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
}

/// Runtime configuration for one enrichment run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Dataset to load.
    pub input: PathBuf,
    /// Destinations, overwritten every run.
    pub outputs: OutputPaths,
    /// Geocoding key column.
    pub name_column: String,
    /// Locality appended to each query.
    pub country_hint: String,
    /// Upper bound on a single geocoding call.
    pub request_timeout: Duration,
    /// Importance threshold below which a match is discarded.
    pub min_importance: Option<f64>,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            input: config.defaults.input.clone(),
            outputs: OutputPaths {
                csv: config.defaults.csv_output.clone(),
                xlsx: config.defaults.xlsx_output.clone(),
            },
            name_column: config.defaults.name_column.clone(),
            country_hint: config.defaults.country_hint.clone(),
            request_timeout: config.geocoder.timeout(),
            min_importance: config.geocoder.min_importance,
        }
    }
}

/// Runtime configuration for downloading the course list.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub url: Url,
    pub outputs: OutputPaths,
    pub user_agent: String,
    pub timeout: Duration,
    /// Keep only rows whose `filter_column` contains one of `keywords`.
    pub filter_column: Option<String>,
    pub keywords: Vec<String>,
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        let xlsx = config.source.output.clone();
        Self {
            url: config.source.courses_url.clone(),
            outputs: OutputPaths {
                csv: xlsx.with_extension("csv"),
                xlsx,
            },
            user_agent: config.geocoder.user_agent.clone(),
            timeout: Duration::from_secs(30),
            filter_column: None,
            keywords: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.coursegeo/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CourseGeoError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.coursegeo/coursegeo.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CourseGeoError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CourseGeoError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CourseGeoError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CourseGeoError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CourseGeoError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("university_name_th"));
        assert!(toml_str.contains("nominatim.openstreetmap.org"));
        assert!(!toml_str.contains("min_importance"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.country_hint, "Thailand");
        assert_eq!(parsed.geocoder.rate_limit_ms, 1000);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
country_hint = "Laos"

[geocoder]
base_url = "http://localhost:8080"
min_importance = 0.25
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.country_hint, "Laos");
        assert_eq!(config.defaults.name_column, "university_name_th");
        assert_eq!(config.geocoder.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.geocoder.min_importance, Some(0.25));
        assert_eq!(config.geocoder.timeout_secs, 10);
    }

    #[test]
    fn pipeline_config_from_app_config() {
        let app = AppConfig::default();
        let pipeline = PipelineConfig::from(&app);
        assert_eq!(pipeline.request_timeout, Duration::from_secs(10));
        assert_eq!(
            pipeline.outputs.csv,
            PathBuf::from("data/filtered_ai_com_courses.csv")
        );
        assert!(pipeline.min_importance.is_none());
    }

    #[test]
    fn fetch_config_derives_csv_sibling() {
        let app = AppConfig::default();
        let fetch = FetchConfig::from(&app);
        assert_eq!(fetch.outputs.xlsx, PathBuf::from("data/courses.xlsx"));
        assert_eq!(fetch.outputs.csv, PathBuf::from("data/courses.csv"));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let dir = std::env::temp_dir().join(format!("coursegeo-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("mkdir");
        let path = dir.join("broken.toml");
        std::fs::write(&path, "[defaults\ninput = ").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, CourseGeoError::Config { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
