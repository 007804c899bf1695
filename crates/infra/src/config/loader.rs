//! Configuration loader
//!
//! ## Loading Strategy
//! 1. If `COURIER_CONFIG` is set, load that file
//! 2. Otherwise probe the standard locations
//! 3. Parse as JSON or TOML (detected by file extension)
//! 4. Validate before returning
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./courier.json` or `./courier.toml` (current working directory)
//! 2. `./config/courier.json` or `./config/courier.toml`
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use courier_domain::{CourierError, DestinationConfig, Result};

use crate::errors::InfraError;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "COURIER_CONFIG";

const FILE_NAMES: [&str; 4] =
    ["courier.json", "courier.toml", "config/courier.json", "config/courier.toml"];

/// Load the destination configuration
///
/// Uses the file named by `COURIER_CONFIG` when set, otherwise the first
/// file found by [`probe_config_paths`].
///
/// # Errors
/// Returns `CourierError::Configuration` if no file is found, the file cannot
/// be parsed, or the parsed configuration is invalid.
pub fn load() -> Result<DestinationConfig> {
    let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    if explicit.is_some() {
        tracing::debug!(env = CONFIG_PATH_ENV, "Using config path from environment");
    }
    load_from_file(explicit)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `CourierError::Configuration` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Validation fails
pub fn load_from_file(path: Option<PathBuf>) -> Result<DestinationConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CourierError::config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CourierError::config("No config file found in any of the standard locations")
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CourierError::config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`); files without
/// an extension are read as JSON. Parsing does not validate.
///
/// # Errors
/// Returns `CourierError::Configuration` if the format is unsupported or
/// parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<DestinationConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| InfraError::from(e).into()),
        "json" => serde_json::from_str(contents).map_err(|e| InfraError::from(e).into()),
        _ => Err(CourierError::config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe standard paths for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(FILE_NAMES.iter().map(|name| cwd.join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(FILE_NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;

    use courier_domain::{AuthConfig, HttpMethod, SinkConfig};
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file =
            tempfile::Builder::new().suffix(suffix).tempfile().expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn test_load_from_file_json() {
        let file = write_temp(
            ".json",
            r#"{
                "url": "https://api.example.com/orders",
                "method": "PUT",
                "timeout": "5s",
                "auth": { "type": "bearer", "token": "t0ken" },
                "staticHeaders": { "X-Source": "courier" },
                "retry": { "maxRetries": 5, "backoffBase": "250ms" },
                "errorSink": { "type": "broker", "topic": "delivery-errors" }
            }"#,
        );

        let config = load_from_file(Some(file.path().to_path_buf())).expect("valid config");

        assert_eq!(config.url, "https://api.example.com/orders");
        assert_eq!(config.method, HttpMethod::Put);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.auth, AuthConfig::Bearer { token: "t0ken".into() });
        assert_eq!(config.static_headers["X-Source"], "courier");
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.backoff_base, Duration::from_millis(250));
        assert_eq!(config.retry.backoff_max, Duration::from_secs(30));
        assert_eq!(config.error_sink, SinkConfig::broker("delivery-errors"));
        assert_eq!(config.success_sink, SinkConfig::file("responses/success.ndjson"));
    }

    #[test]
    fn test_load_from_file_toml() {
        let file = write_temp(
            ".toml",
            r#"
                url = "http://localhost:8080/hook"
                timeout = "1m30s"
                includeRequestMetadata = true

                [auth]
                type = "oauth2"
                clientId = "id"
                clientSecret = "secret"
                tokenUrl = "http://localhost:8080/token"
                scopes = "read, write"

                [successSink]
                type = "file"
                path = "out/ok.ndjson"
            "#,
        );

        let config = load_from_file(Some(file.path().to_path_buf())).expect("valid config");

        assert_eq!(config.timeout, Duration::from_secs(90));
        assert!(config.include_request_metadata);
        assert_eq!(config.success_sink, SinkConfig::file("out/ok.ndjson"));
        match config.auth {
            AuthConfig::OAuth2 { scopes, .. } => assert_eq!(scopes, vec!["read", "write"]),
            other => panic!("expected oauth2 auth, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_config_is_rejected_after_parsing() {
        let file = write_temp(".json", r#"{ "url": "ftp://example.com" }"#);

        let err = load_from_file(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, CourierError::Configuration(ref m) if m.contains("url")));
    }

    #[test]
    fn test_load_from_file_missing_path() {
        let err = load_from_file(Some(PathBuf::from("/definitely/not/here.json"))).unwrap_err();
        assert!(matches!(err, CourierError::Configuration(ref m) if m.contains("not found")));
    }

    #[test]
    fn test_parse_config_reports_format_errors() {
        let err = parse_config("{ not json", Path::new("a.json")).unwrap_err();
        assert!(matches!(err, CourierError::Configuration(ref m) if m.contains("JSON")));

        let err = parse_config("url = ", Path::new("a.toml")).unwrap_err();
        assert!(matches!(err, CourierError::Configuration(ref m) if m.contains("TOML")));

        let err = parse_config("url: x", Path::new("a.yaml")).unwrap_err();
        assert!(matches!(err, CourierError::Configuration(ref m) if m.contains("yaml")));
    }

    #[test]
    fn test_load_uses_env_path() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        let file = write_temp(".json", r#"{ "url": "https://example.com" }"#);

        std::env::set_var(CONFIG_PATH_ENV, file.path());
        let result = load();
        std::env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.expect("config from env path").url, "https://example.com");
    }
}
