use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PANLINK_CONFIG";

/// Config file looked up in the working directory when `PANLINK_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "panlink.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub recognizer: RecognizerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Resolution pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Literal token that introduces an identifier in running text.
    #[serde(default = "default_id_marker")]
    pub id_marker: String,
    /// Radius of the first recognizer window, in characters.
    #[serde(default = "default_narrow_radius")]
    pub narrow_radius: usize,
    /// Radius of the escalation window, in characters.
    #[serde(default = "default_wide_radius")]
    pub wide_radius: usize,
    /// Identifiers resolved concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            id_marker: default_id_marker(),
            narrow_radius: default_narrow_radius(),
            wide_radius: default_wide_radius(),
            concurrency: default_concurrency(),
        }
    }
}

/// Named-entity recognizer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RecognizerConfig {
    /// `http` (external NER service) or `heuristic` (built-in regex recognizer).
    #[serde(default = "default_provider")]
    pub provider: String,
    pub endpoint: Option<String>,
    pub health_endpoint: Option<String>,
    /// Name of the environment variable holding a bearer token, if the service needs one.
    pub api_key_env: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: None,
            health_endpoint: None,
            api_key_env: None,
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_sample_size")]
    pub summary_sample: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            summary_sample: default_sample_size(),
        }
    }
}

fn default_id_marker() -> String {
    "PAN".to_string()
}

fn default_narrow_radius() -> usize {
    200
}

fn default_wide_radius() -> usize {
    400
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_provider() -> String {
    "heuristic".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> usize {
    2
}

fn default_cache_capacity() -> usize {
    512
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sample_size() -> usize {
    10
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in PANLINK_CONFIG environment variable (must exist)
    /// 2. ./panlink.toml in current directory (optional; defaults apply without it)
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(PathBuf::from(path))?,
            Err(_) => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    log::debug!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                    Config::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: PathBuf) -> Result<Self> {
        let config_str = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.extraction.id_marker.trim().is_empty() {
            anyhow::bail!("extraction.id_marker must not be empty");
        }

        if self.extraction.narrow_radius > self.extraction.wide_radius {
            anyhow::bail!(
                "extraction.narrow_radius ({}) must not exceed extraction.wide_radius ({})",
                self.extraction.narrow_radius,
                self.extraction.wide_radius
            );
        }

        if self.extraction.concurrency == 0 {
            anyhow::bail!("extraction.concurrency must be greater than 0");
        }

        match self.recognizer.provider.as_str() {
            "heuristic" => {}
            "http" => {
                if self.recognizer.endpoint.is_none() {
                    anyhow::bail!("recognizer.endpoint is required when provider = \"http\"");
                }
            }
            other => anyhow::bail!(
                "recognizer.provider must be \"http\" or \"heuristic\", got \"{}\"",
                other
            ),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide cwd and env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    const TEST_CONFIG: &str = r#"
[extraction]
id_marker = "PAN"
narrow_radius = 150
wide_radius = 300
concurrency = 2

[recognizer]
provider = "http"
endpoint = "http://127.0.0.1:8080/ner"
health_endpoint = "http://127.0.0.1:8080/health"
timeout_ms = 5000

[output]
log_level = "debug"
"#;

    /// Restores cwd when dropped (e.g. on panic).
    struct CwdGuard(std::path::PathBuf);
    impl Drop for CwdGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.0);
        }
    }

    fn with_config_env(config_path: Option<&std::path::Path>, f: impl FnOnce()) {
        let original = std::env::var(CONFIG_ENV).ok();
        match config_path {
            Some(p) => std::env::set_var(CONFIG_ENV, p.to_str().unwrap()),
            None => std::env::remove_var(CONFIG_ENV),
        }
        f();
        std::env::remove_var(CONFIG_ENV);
        if let Some(val) = original {
            std::env::set_var(CONFIG_ENV, val);
        }
    }

    #[test]
    fn test_config_load_success() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.toml");
        fs::write(&config_path, TEST_CONFIG).unwrap();

        with_config_env(Some(&config_path), || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            let config = config.unwrap();
            assert_eq!(config.extraction.narrow_radius, 150);
            assert_eq!(config.extraction.wide_radius, 300);
            assert_eq!(config.extraction.concurrency, 2);
            assert_eq!(config.recognizer.provider, "http");
            assert_eq!(config.recognizer.timeout_ms, 5000);
            assert_eq!(config.recognizer.max_retries, 2);
            assert_eq!(config.output.log_level, "debug");
        });
    }

    #[test]
    fn test_config_defaults_without_file() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        let _cwd = CwdGuard(original_dir);
        std::env::set_current_dir(temp_dir.path()).unwrap();

        with_config_env(None, || {
            let config = Config::load().unwrap();
            assert_eq!(config.extraction.id_marker, "PAN");
            assert_eq!(config.extraction.narrow_radius, 200);
            assert_eq!(config.extraction.wide_radius, 400);
            assert_eq!(config.recognizer.provider, "heuristic");
            assert_eq!(config.output.summary_sample, 10);
        });
    }

    #[test]
    fn test_config_picks_up_default_file() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(DEFAULT_CONFIG_FILE), TEST_CONFIG).unwrap();
        let original_dir = std::env::current_dir().unwrap();
        let _cwd = CwdGuard(original_dir);
        std::env::set_current_dir(temp_dir.path()).unwrap();

        with_config_env(None, || {
            let config = Config::load().unwrap();
            assert_eq!(config.extraction.narrow_radius, 150);
        });
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        with_config_env(Some(std::path::Path::new("nonexistent.toml")), || {
            let config = Config::load();
            assert!(config.is_err());
            assert!(config.unwrap_err().to_string().contains("nonexistent.toml"));
        });
    }

    #[test]
    fn test_validate_radius_order() {
        let mut config = Config::default();
        config.extraction.narrow_radius = 500;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("narrow_radius"));
    }

    #[test]
    fn test_validate_http_needs_endpoint() {
        let mut config = Config::default();
        config.recognizer.provider = "http".to_string();
        assert!(config.validate().is_err());
        config.recognizer.endpoint = Some("http://localhost:8080/ner".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = Config::default();
        config.recognizer.provider = "bert".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_concurrency() {
        let mut config = Config::default();
        config.extraction.concurrency = 0;
        assert!(config.validate().is_err());
    }
}
