//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and environment
//! variables and merging them with proper precedence rules.

use crate::error::HandleCheckError;
use crate::platforms::registry::{get_builtin_platforms, validate_platform};
use crate::platforms::PlatformRegistry;
use crate::types::{PlatformSpec, SuggestionConfig, SuggestionPolicy};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Configuration loaded from TOML files.
///
/// This represents the structure of configuration files that users can create
/// to set default values, tune suggestions and add their own platforms.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Suggestion generator settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<SuggestionFileConfig>,

    /// Platform table customization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<PlatformsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Per-request timeout (as string, e.g., "6s", "500ms", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Maximum probes in flight
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Default User-Agent header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Default JSON output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,

    /// Default pretty output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,
}

/// Suggestion settings as written in a config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SuggestionFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Maximum number of suggestions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap: Option<usize>,

    /// "any" or "key"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,

    /// Platforms that count for the "key" policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_platforms: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffixes: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub separators: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub numbers: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefixes: Option<Vec<String>>,
}

/// Platform table customization.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlatformsConfig {
    /// Start from the built-in platforms (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_builtin: Option<bool>,

    /// Built-in platforms to leave out, by name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<Vec<String>>,

    /// Extra platforms; a custom platform named like a built-in one replaces it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<Vec<PlatformSpec>>,
}

/// Maximum suggestion cap accepted from configuration.
const MAX_SUGGESTION_CAP: usize = 100;

/// Longest per-request timeout accepted from configuration.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(3600);

impl SuggestionFileConfig {
    /// Layer these settings over `base`.
    ///
    /// # Errors
    ///
    /// Returns `HandleCheckError::ConfigError` for an unknown policy name or
    /// a "key" policy without key platforms.
    pub fn apply(&self, mut base: SuggestionConfig) -> Result<SuggestionConfig, HandleCheckError> {
        if let Some(enabled) = self.enabled {
            base.enabled = enabled;
        }
        if let Some(cap) = self.cap {
            base.cap = cap;
        }
        if let Some(suffixes) = &self.suffixes {
            base.suffixes = suffixes.clone();
        }
        if let Some(separators) = &self.separators {
            base.separators = separators.clone();
        }
        if let Some(numbers) = &self.numbers {
            base.numbers = numbers.clone();
        }
        if let Some(prefixes) = &self.prefixes {
            base.prefixes = prefixes.clone();
        }

        match self.policy.as_deref().map(str::to_lowercase).as_deref() {
            None => {
                if let Some(keys) = &self.key_platforms {
                    if let SuggestionPolicy::KeyPlatforms(_) = base.policy {
                        base.policy = SuggestionPolicy::KeyPlatforms(keys.clone());
                    }
                }
            }
            Some("any") => base.policy = SuggestionPolicy::AnyUnavailable,
            Some("key") => {
                let keys = self.key_platforms.clone().unwrap_or_default();
                if keys.is_empty() {
                    return Err(HandleCheckError::config(
                        "Suggestion policy 'key' requires a non-empty 'key_platforms' list",
                    ));
                }
                base.policy = SuggestionPolicy::KeyPlatforms(keys);
            }
            Some(other) => {
                return Err(HandleCheckError::config(format!(
                    "Invalid suggestion policy '{}'. Use 'any' or 'key'",
                    other
                )));
            }
        }

        Ok(base)
    }
}

impl PlatformsConfig {
    /// Build the platform registry described by this section.
    ///
    /// Built-ins come first in their usual order (minus disabled ones, with
    /// same-named custom platforms replacing them in place); remaining custom
    /// platforms follow in file order.
    pub fn build_registry(&self) -> Result<PlatformRegistry, HandleCheckError> {
        let disabled = self.disabled.clone().unwrap_or_default();
        let is_disabled = |name: &str| disabled.iter().any(|d| d.eq_ignore_ascii_case(name));

        let mut platforms: Vec<PlatformSpec> = if self.include_builtin.unwrap_or(true) {
            get_builtin_platforms()
                .iter()
                .filter(|p| !is_disabled(&p.name))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        for name in &disabled {
            if !get_builtin_platforms()
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(name))
            {
                warn!(platform = %name, "disabled platform is not a built-in platform");
            }
        }

        for custom in self.custom.iter().flatten() {
            match platforms
                .iter_mut()
                .find(|p| p.name.eq_ignore_ascii_case(&custom.name))
            {
                Some(existing) => *existing = custom.clone(),
                None => platforms.push(custom.clone()),
            }
        }

        PlatformRegistry::new(platforms)
    }
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Default)]
pub struct ConfigManager;

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    ///
    /// # Returns
    ///
    /// The parsed and validated configuration.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, HandleCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(HandleCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            HandleCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is lowest, then the global file in `$HOME`, then a local
    /// file in the current directory.
    pub fn discover_and_load(&self) -> Result<FileConfig, HandleCheckError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => warn!(path = %path.display(), "skipping config file: {}", e),
            }
        }

        if loaded_files.len() > 1 {
            info!(
                "multiple config files found, later ones take precedence: {}",
                loaded_files
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Ok(merged_config)
    }

    /// Local configuration file in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./handle-scout.toml", "./.handle-scout.toml"]
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Global configuration file in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".handle-scout.toml", "handle-scout.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// XDG configuration file.
    ///
    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("handle-scout").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    concurrency: higher_defaults.concurrency.or(lower_defaults.concurrency),
                    user_agent: higher_defaults.user_agent.or(lower_defaults.user_agent),
                    json: higher_defaults.json.or(lower_defaults.json),
                    pretty: higher_defaults.pretty.or(lower_defaults.pretty),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            suggestions: match (lower.suggestions, higher.suggestions) {
                (Some(lower_sugg), Some(higher_sugg)) => Some(SuggestionFileConfig {
                    enabled: higher_sugg.enabled.or(lower_sugg.enabled),
                    cap: higher_sugg.cap.or(lower_sugg.cap),
                    policy: higher_sugg.policy.or(lower_sugg.policy),
                    key_platforms: higher_sugg.key_platforms.or(lower_sugg.key_platforms),
                    suffixes: higher_sugg.suffixes.or(lower_sugg.suffixes),
                    separators: higher_sugg.separators.or(lower_sugg.separators),
                    numbers: higher_sugg.numbers.or(lower_sugg.numbers),
                    prefixes: higher_sugg.prefixes.or(lower_sugg.prefixes),
                }),
                (lower_sugg, higher_sugg) => higher_sugg.or(lower_sugg),
            },
            platforms: match (lower.platforms, higher.platforms) {
                (Some(lower_platforms), Some(higher_platforms)) => {
                    // Custom platforms merge by name, higher precedence wins
                    let mut custom = lower_platforms.custom.unwrap_or_default();
                    for spec in higher_platforms.custom.unwrap_or_default() {
                        match custom
                            .iter_mut()
                            .find(|p| p.name.eq_ignore_ascii_case(&spec.name))
                        {
                            Some(existing) => *existing = spec,
                            None => custom.push(spec),
                        }
                    }
                    Some(PlatformsConfig {
                        include_builtin: higher_platforms
                            .include_builtin
                            .or(lower_platforms.include_builtin),
                        disabled: higher_platforms.disabled.or(lower_platforms.disabled),
                        custom: if custom.is_empty() { None } else { Some(custom) },
                    })
                }
                (lower_platforms, higher_platforms) => higher_platforms.or(lower_platforms),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), HandleCheckError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > 100 {
                    return Err(HandleCheckError::config(
                        "Concurrency must be between 1 and 100",
                    ));
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                if parse_timeout_string(timeout_str).is_none() {
                    return Err(HandleCheckError::config(format!(
                        "Invalid timeout format '{}'. Use format like '6s', '500ms', '1m'",
                        timeout_str
                    )));
                }
            }
        }

        if let Some(suggestions) = &config.suggestions {
            if let Some(cap) = suggestions.cap {
                if cap > MAX_SUGGESTION_CAP {
                    return Err(HandleCheckError::config(format!(
                        "Suggestion cap must be at most {}",
                        MAX_SUGGESTION_CAP
                    )));
                }
            }
            suggestions.apply(SuggestionConfig::default())?;
        }

        if let Some(platforms) = &config.platforms {
            for spec in platforms.custom.iter().flatten() {
                validate_platform(spec)?;
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via HS_* environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub timeout: Option<String>,
    pub concurrency: Option<usize>,
    pub user_agent: Option<String>,
    pub suggestion_cap: Option<usize>,
    pub json: Option<bool>,
    pub pretty: Option<bool>,
    pub config: Option<String>,
}

/// Load configuration from environment variables.
///
/// Parses all HS_* environment variables. Invalid values are logged as
/// warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    let mut env_config = EnvConfig::default();

    // HS_TIMEOUT - per-request timeout
    if let Ok(timeout_str) = env::var("HS_TIMEOUT") {
        if parse_timeout_string(&timeout_str).is_some() {
            info!("using HS_TIMEOUT={}", timeout_str);
            env_config.timeout = Some(timeout_str);
        } else {
            warn!(
                "invalid HS_TIMEOUT='{}', use format like '6s', '500ms', '1m'",
                timeout_str
            );
        }
    }

    // HS_CONCURRENCY - probes in flight
    if let Ok(val) = env::var("HS_CONCURRENCY") {
        match val.parse::<usize>() {
            Ok(concurrency) if (1..=100).contains(&concurrency) => {
                info!("using HS_CONCURRENCY={}", concurrency);
                env_config.concurrency = Some(concurrency);
            }
            _ => warn!("invalid HS_CONCURRENCY='{}', must be 1-100", val),
        }
    }

    // HS_USER_AGENT - default User-Agent header
    if let Ok(user_agent) = env::var("HS_USER_AGENT") {
        if !user_agent.trim().is_empty() {
            info!("using HS_USER_AGENT={}", user_agent);
            env_config.user_agent = Some(user_agent);
        }
    }

    // HS_SUGGESTION_CAP - maximum suggestions
    if let Ok(val) = env::var("HS_SUGGESTION_CAP") {
        match val.parse::<usize>() {
            Ok(cap) if cap <= MAX_SUGGESTION_CAP => {
                info!("using HS_SUGGESTION_CAP={}", cap);
                env_config.suggestion_cap = Some(cap);
            }
            _ => warn!(
                "invalid HS_SUGGESTION_CAP='{}', must be 0-{}",
                val, MAX_SUGGESTION_CAP
            ),
        }
    }

    env_config.json = env_bool("HS_JSON");
    env_config.pretty = env_bool("HS_PRETTY");

    // HS_CONFIG - explicit config file
    if let Ok(config_path) = env::var("HS_CONFIG") {
        if !config_path.trim().is_empty() {
            info!("using HS_CONFIG={}", config_path);
            env_config.config = Some(config_path);
        }
    }

    env_config
}

/// Read a boolean environment variable, warning on unrecognized values.
fn env_bool(name: &str) -> Option<bool> {
    let val = env::var(name).ok()?;
    let parsed = parse_bool(&val);
    match parsed {
        Some(flag) => info!("using {}={}", name, flag),
        None => warn!("invalid {}='{}', use true/false", name, val),
    }
    parsed
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a timeout string like "6s", "500ms", "2m" into a duration.
///
/// A bare number is taken as seconds. Zero and anything above
/// [`MAX_TIMEOUT`] are rejected.
pub fn parse_timeout_string(timeout_str: &str) -> Option<Duration> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let duration = if let Some(ms) = timeout_str.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        timeout_str.parse::<u64>().ok().map(Duration::from_secs)
    }?;

    if duration.is_zero() || duration > MAX_TIMEOUT {
        None
    } else {
        Some(duration)
    }
}
