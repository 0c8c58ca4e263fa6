use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, str::FromStr};
use thiserror::Error;

use crate::auth::{DEFAULT_CREDENTIAL_COOKIE, LOGIN_PATH};

/// Errors raised while resolving the server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("Unsupported configuration format '{0}'. Use 'yaml', 'json' or 'toml'.")]
    UnsupportedFormat(String),
    #[error("Invalid {var} value '{value}': {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Deployment profile used to pick defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Dev,
    Test,
    Prod,
}

impl FromStr for Profile {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "test" => Ok(Self::Test),
            "prod" | "production" => Ok(Self::Prod),
            _ => Err("expected one of dev, test, prod"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err("expected 'text' or 'json'"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Header used to propagate request ids.
    pub request_id_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_id_header: "x-request-id".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Edge route guard settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GuardConfig {
    /// Cookie that carries the bearer credential.
    pub cookie_name: String,
    /// Redirect target for every denied request.
    pub login_path: String,
    /// Path prefixes that are never gated.
    pub exempt_prefixes: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_CREDENTIAL_COOKIE.to_string(),
            login_path: LOGIN_PATH.to_string(),
            exempt_prefixes: [
                LOGIN_PATH,
                "/assets",
                "/pkg",
                "/favicon.ico",
                "/icons",
                "/images",
                "/api",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HstsConfig {
    pub enabled: bool,
    pub max_age_seconds: u64,
    pub include_subdomains: bool,
    pub preload: bool,
}

impl Default for HstsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_age_seconds: 63_072_000,
            include_subdomains: true,
            preload: false,
        }
    }
}

/// Policy sent when the configuration does not name one. Inline scripts in
/// the SPA index are hashed into `script-src` at start-up.
pub const DEFAULT_CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
     script-src 'self' 'wasm-unsafe-eval'; frame-ancestors 'none'; object-src 'none'; \
     base-uri 'self'";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SecurityConfig {
    pub hsts: HstsConfig,
    pub content_security_policy: String,
    /// Add a `'sha256-...'` source for every inline `<script>` in the SPA
    /// index, so the bundle bootstrap may run.
    pub hash_inline_scripts: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            hsts: HstsConfig::default(),
            content_security_policy: DEFAULT_CONTENT_SECURITY_POLICY.to_string(),
            hash_inline_scripts: true,
        }
    }
}

/// Where the compiled single-page app lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WebConfig {
    pub static_dir: PathBuf,
    pub spa_index: PathBuf,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("../paydesk-web/dist"),
            spa_index: PathBuf::from("../paydesk-web/dist/index.html"),
        }
    }
}

/// The main configuration structure for the PayDesk edge server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub profile: Profile,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub guard: GuardConfig,
    pub security: SecurityConfig,
    pub web: WebConfig,
}

impl Config {
    /// Generates the defaults for a deployment profile.
    #[must_use]
    pub fn default_for_profile(profile: Profile) -> Self {
        let mut config = Self {
            profile,
            ..Self::default()
        };

        match profile {
            Profile::Dev => {
                config.logging.level = "debug".to_string();
            }
            Profile::Test => {
                config.logging.level = "warn".to_string();
            }
            Profile::Prod => {
                config.logging.format = LogFormat::Json;
                config.security.hsts.enabled = true;
            }
        }

        config
    }

    /// Loads the configuration from defaults, an optional file, environment
    /// variables, and finally the command-line port.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a YAML, JSON or TOML file.
    /// * `port_override` - Optional port number that beats every other source.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when the file cannot be read or parsed, an
    /// environment variable holds an invalid value, or validation fails.
    pub fn load_config(
        config_path: Option<PathBuf>,
        port_override: Option<u16>,
    ) -> Result<Self, ConfigError> {
        let profile = match env::var("PAYDESK_PROFILE") {
            Ok(value) => value.parse::<Profile>().map_err(|reason| ConfigError::InvalidEnv {
                var: "PAYDESK_PROFILE",
                value,
                reason,
            })?,
            Err(_) => Profile::default(),
        };

        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::default_for_profile(profile),
        };

        config.apply_env_overrides()?;

        if let Some(port) = port_override {
            config.server.port = port;
        }

        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let parsed: Result<Self, String> = match extension.as_str() {
            "yaml" | "yml" => serde_yml::from_str(&content).map_err(|err| err.to_string()),
            "json" => serde_json::from_str(&content).map_err(|err| err.to_string()),
            "toml" => toml::from_str(&content).map_err(|err| err.to_string()),
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        parsed.map_err(|message| ConfigError::Parse { path, message })
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(port) = env::var("PAYDESK_SERVER_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "PAYDESK_SERVER_PORT",
                value: port,
                reason: "must be a valid number between 1 and 65535",
            })?;
        }
        if let Ok(level) = env::var("PAYDESK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("PAYDESK_LOG_FORMAT") {
            self.logging.format = format.parse().map_err(|reason| ConfigError::InvalidEnv {
                var: "PAYDESK_LOG_FORMAT",
                value: format,
                reason,
            })?;
        }
        if let Ok(cookie_name) = env::var("PAYDESK_CREDENTIAL_COOKIE") {
            self.guard.cookie_name = cookie_name;
        }
        if let Ok(login_path) = env::var("PAYDESK_LOGIN_PATH") {
            self.guard.login_path = login_path;
        }
        if let Ok(static_dir) = env::var("PAYDESK_STATIC_DIR") {
            self.web.spa_index = PathBuf::from(&static_dir).join("index.html");
            self.web.static_dir = PathBuf::from(static_dir);
        }
        Ok(())
    }

    /// Validate the resolved configuration.
    ///
    /// # Errors
    /// Returns every problem found, not just the first one.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("Invalid server port. Must be greater than 0.".to_string());
        }

        let cookie_name = self.guard.cookie_name.as_str();
        if cookie_name.is_empty()
            || !cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            errors.push(format!("Invalid credential cookie name '{cookie_name}'."));
        }

        if !self.guard.login_path.starts_with('/') {
            errors.push(format!(
                "Login path '{}' must start with '/'.",
                self.guard.login_path
            ));
        }

        if self.guard.login_path.trim_end_matches('/').is_empty() {
            errors.push("Login path '/' would exempt every path from the guard.".to_string());
        }

        for prefix in &self.guard.exempt_prefixes {
            if !prefix.starts_with('/') {
                errors.push(format!("Exempt prefix '{prefix}' must start with '/'."));
            } else if prefix.trim_end_matches('/').is_empty() {
                errors.push(format!(
                    "Exempt prefix '{prefix}' would exempt every path from the guard."
                ));
            }
        }

        if self.security.content_security_policy.trim().is_empty() {
            errors.push("Content security policy must not be empty.".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: [&str; 7] = [
        "PAYDESK_PROFILE",
        "PAYDESK_SERVER_PORT",
        "PAYDESK_LOG_LEVEL",
        "PAYDESK_LOG_FORMAT",
        "PAYDESK_CREDENTIAL_COOKIE",
        "PAYDESK_LOGIN_PATH",
        "PAYDESK_STATIC_DIR",
    ];

    fn cleanup_env_vars() {
        for var in ENV_VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn defaults_gate_everything_but_assets_login_and_api() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.guard.cookie_name, "auth_token");
        assert_eq!(config.guard.login_path, "/login");
        for prefix in ["/login", "/api", "/favicon.ico", "/images", "/icons", "/assets"] {
            assert!(
                config.guard.exempt_prefixes.iter().any(|p| p == prefix),
                "missing default exempt prefix {prefix}"
            );
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn profiles_adjust_logging_and_hsts() {
        let prod = Config::default_for_profile(Profile::Prod);
        assert_eq!(prod.logging.format, LogFormat::Json);
        assert!(prod.security.hsts.enabled);

        let dev = Config::default_for_profile(Profile::Dev);
        assert_eq!(dev.logging.level, "debug");
        assert!(!dev.security.hsts.enabled);
    }

    #[test]
    #[serial]
    fn load_config_without_file_uses_defaults_and_port_override() {
        cleanup_env_vars();
        let config = Config::load_config(None, Some(3000)).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.profile, Profile::Dev);
    }

    #[test]
    #[serial]
    fn environment_overrides_file_and_cli_overrides_environment() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("paydesk.yaml");
        fs::write(
            &path,
            r#"
server:
  port: 4000
guard:
  cookie_name: "file_cookie"
logging:
  level: "trace"
"#,
        )
        .unwrap();

        unsafe {
            std::env::set_var("PAYDESK_SERVER_PORT", "9090");
            std::env::set_var("PAYDESK_CREDENTIAL_COOKIE", "env_cookie");
            std::env::set_var("PAYDESK_LOG_FORMAT", "json");
        }

        let config = Config::load_config(Some(path.clone()), None).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.guard.cookie_name, "env_cookie");
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.logging.format, LogFormat::Json);
        // Sections missing from the file keep their defaults.
        assert_eq!(config.guard.login_path, "/login");

        let config = Config::load_config(Some(path), Some(7777)).unwrap();
        assert_eq!(config.server.port, 7777);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn json_and_toml_files_are_supported() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();

        let json_path = temp_dir.path().join("paydesk.json");
        fs::write(
            &json_path,
            r#"{ "guard": { "exempt_prefixes": ["/login", "/static"] } }"#,
        )
        .unwrap();
        let config = Config::load_config(Some(json_path), None).unwrap();
        assert_eq!(config.guard.exempt_prefixes, vec!["/login", "/static"]);

        let toml_path = temp_dir.path().join("paydesk.toml");
        fs::write(&toml_path, "[server]\nport = 5050\n").unwrap();
        let config = Config::load_config(Some(toml_path), None).unwrap();
        assert_eq!(config.server.port, 5050);
    }

    #[test]
    #[serial]
    fn invalid_port_environment_is_reported() {
        cleanup_env_vars();
        unsafe {
            std::env::set_var("PAYDESK_SERVER_PORT", "invalid_port");
        }

        let err = Config::load_config(None, None).unwrap_err();
        assert!(err.to_string().contains("PAYDESK_SERVER_PORT"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn unsupported_and_malformed_files_fail() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();

        let ini = temp_dir.path().join("paydesk.ini");
        fs::write(&ini, "port=1").unwrap();
        assert!(matches!(
            Config::load_config(Some(ini), None),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        let yaml = temp_dir.path().join("broken.yaml");
        fs::write(&yaml, "server: [invalid yaml structure").unwrap();
        assert!(matches!(
            Config::load_config(Some(yaml), None),
            Err(ConfigError::Parse { .. })
        ));

        let missing = temp_dir.path().join("missing.yaml");
        assert!(matches!(
            Config::load_config(Some(missing), None),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    #[serial]
    fn zero_port_fails_validation() {
        cleanup_env_vars();
        let err = Config::load_config(None, Some(0)).unwrap_err();
        assert!(err.to_string().contains("Invalid server port"));
    }

    #[test]
    fn validation_collects_every_guard_problem() {
        let mut config = Config::default();
        config.guard.cookie_name = "bad cookie".to_string();
        config.guard.login_path = "login".to_string();
        config.guard.exempt_prefixes.push("api".to_string());

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn root_prefix_would_disable_the_guard() {
        for root in ["/", "//"] {
            let mut config = Config::default();
            config.guard.exempt_prefixes.push(root.to_string());
            let errors = config.validate().unwrap_err();
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("every path"), "{errors:?}");
        }

        let mut config = Config::default();
        config.guard.login_path = "/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn root_prefix_in_a_file_fails_to_load() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("paydesk.yaml");
        fs::write(&path, "guard:\n  exempt_prefixes: [\"/login\", \"/\"]\n").unwrap();

        let err = Config::load_config(Some(path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn security_policy_comes_from_the_file_or_the_default() {
        let config = Config::default();
        assert_eq!(
            config.security.content_security_policy,
            DEFAULT_CONTENT_SECURITY_POLICY
        );
        assert!(config.security.hash_inline_scripts);

        let parsed: Config = serde_yml::from_str(
            "security:\n  content_security_policy: \"default-src 'none'\"\n  hash_inline_scripts: false\n",
        )
        .unwrap();
        assert_eq!(parsed.security.content_security_policy, "default-src 'none'");
        assert!(!parsed.security.hash_inline_scripts);
        assert!(!parsed.security.hsts.enabled);

        let mut blank = Config::default();
        blank.security.content_security_policy = " ".to_string();
        assert!(blank.validate().is_err());
    }
}
