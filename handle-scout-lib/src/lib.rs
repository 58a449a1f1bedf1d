//! # Handle Scout Library
//!
//! A fast library for checking whether a username is free on popular
//! developer and social platforms.
//!
//! Every platform is probed concurrently with a short timeout. A probe never
//! fails the whole check: it ends as `available`, `taken`, `unknown` or
//! `error`, and results always come back in platform-table order. When the
//! handle is not free everywhere, alternate handles are suggested.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use handle_scout_lib::HandleChecker;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = HandleChecker::new()?;
//!     let batch = checker.check_handle("octocat").await?;
//!
//!     for result in &batch.results {
//!         println!("{} - {} ({})", result.platform, result.status, result.reason);
//!     }
//!     println!("Try instead: {}", batch.suggestions.join(", "));
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Declarative platforms**: status buckets, body markers and headers per platform
//! - **Concurrent probing**: bounded fan-out with stable result order
//! - **Suggestions**: capped, validated, deduplicated alternate handles
//! - **Configurable**: TOML files and `HS_*` environment variables

// Re-export main public API types and functions
pub use checker::{HandleChecker, ProbeStream};
pub use concurrent::ConcurrentProcessor;
pub use config::{
    load_env_config, parse_timeout_string, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
    PlatformsConfig, SuggestionFileConfig,
};
pub use error::HandleCheckError;
pub use platforms::{
    classify_response, get_builtin_platform_names, get_builtin_platforms, PlatformRegistry, Prober,
};
pub use types::{
    CheckBatch, CheckConfig, PlatformSpec, ProbeResult, ProbeStatus, SuggestionConfig,
    SuggestionPolicy, USERNAME_PLACEHOLDER,
};
pub use utils::{fill_template, is_valid_username, validate_username};

// Public modules
pub mod suggest;

// Internal modules
mod checker;
mod concurrent;
mod config;
mod error;
mod platforms;
mod types;
mod utils;

pub type Result<T> = std::result::Result<T, HandleCheckError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Check a username on the built-in platforms with default settings.
///
/// Shorthand for `HandleChecker::new()?.check_handle(username)`.
pub async fn check_handle(username: &str) -> Result<CheckBatch> {
    HandleChecker::new()?.check_handle(username).await
}
