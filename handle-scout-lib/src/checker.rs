//! Main handle checker implementation.
//!
//! This module provides the `HandleChecker` struct that fans a username out
//! to every platform in a registry, gathers the verdicts in registry order,
//! and derives alternate-handle suggestions from them.

use crate::concurrent::ConcurrentProcessor;
use crate::error::HandleCheckError;
use crate::platforms::{PlatformRegistry, Prober};
use crate::suggest::generate_suggestions;
use crate::types::{CheckBatch, CheckConfig, ProbeResult, ProbeStatus};
use crate::utils::validate_username;
use chrono::Utc;
use futures_util::stream::Stream;
use std::pin::Pin;
use tracing::info;

/// Main checker that coordinates probing across platforms.
///
/// The `HandleChecker` handles:
/// - Username validation
/// - Concurrent probing with stable output order
/// - Suggestion generation
///
/// # Example
///
/// ```rust,no_run
/// use handle_scout_lib::HandleChecker;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = HandleChecker::new()?;
///     let batch = checker.check_handle("octocat").await?;
///
///     for result in &batch.results {
///         println!("{}: {}", result.platform, result.status);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct HandleChecker {
    /// Configuration settings for this checker instance
    config: CheckConfig,
    /// Platforms probed on every check
    registry: PlatformRegistry,
    /// Shared HTTP prober
    prober: Prober,
}

/// Stream of `(registry index, result)` pairs in completion order.
pub type ProbeStream<'a> = Pin<Box<dyn Stream<Item = (usize, ProbeResult)> + Send + 'a>>;

impl HandleChecker {
    /// Create a checker with default configuration and the built-in platforms.
    ///
    /// Default settings:
    /// - Timeout: 6 seconds per request
    /// - Concurrency: 32 (all built-in platforms at once)
    /// - Suggestions: on, triggered by any non-available platform, capped at 18
    pub fn new() -> Result<Self, HandleCheckError> {
        Self::with_config(CheckConfig::default(), PlatformRegistry::builtin())
    }

    /// Create a checker with custom configuration and platforms.
    ///
    /// # Example
    ///
    /// ```rust
    /// use handle_scout_lib::{CheckConfig, HandleChecker, PlatformRegistry};
    /// use std::time::Duration;
    ///
    /// let config = CheckConfig::default()
    ///     .with_timeout(Duration::from_secs(3))
    ///     .with_concurrency(8);
    ///
    /// let checker = HandleChecker::with_config(config, PlatformRegistry::builtin()).unwrap();
    /// assert_eq!(checker.registry().len(), 10);
    /// ```
    pub fn with_config(
        config: CheckConfig,
        registry: PlatformRegistry,
    ) -> Result<Self, HandleCheckError> {
        let prober = Prober::new(&config)?;
        Ok(Self {
            config,
            registry,
            prober,
        })
    }

    /// Check a username on every platform.
    ///
    /// The username is validated first; that is the only way this fails.
    /// For a valid username the batch always holds exactly one result per
    /// platform, in registry order, whatever happened to the individual
    /// requests.
    ///
    /// # Errors
    ///
    /// Returns `HandleCheckError::InvalidUsername` if the username is not
    /// 2-30 letters, digits, underscores or dots.
    pub async fn check_handle(&self, username: &str) -> Result<CheckBatch, HandleCheckError> {
        validate_username(username)?;

        info!(
            username,
            platforms = self.registry.len(),
            "checking handle"
        );

        let results = self.probe_all(username).await;
        let suggestions = generate_suggestions(username, &results, &self.config.suggestions);

        info!(
            username,
            available = count(&results, ProbeStatus::Available),
            taken = count(&results, ProbeStatus::Taken),
            unknown = count(&results, ProbeStatus::Unknown),
            errors = count(&results, ProbeStatus::Error),
            suggestions = suggestions.len(),
            "check finished"
        );

        Ok(CheckBatch {
            username: username.to_string(),
            checked_at: Utc::now(),
            results,
            suggestions,
        })
    }

    /// Probe every platform and return results in registry order.
    ///
    /// Does not validate the username.
    pub async fn probe_all(&self, username: &str) -> Vec<ProbeResult> {
        let probes: Vec<_> = self
            .registry
            .iter()
            .map(|spec| self.prober.probe(spec, username))
            .collect();

        let slots = ConcurrentProcessor::new(self.config.concurrency)
            .run_indexed(probes)
            .await;

        slots
            .into_iter()
            .zip(self.registry.iter())
            .map(|(slot, spec)| {
                slot.unwrap_or_else(|| {
                    ProbeResult::failed(&spec.name, None, None, "probe did not complete")
                })
            })
            .collect()
    }

    /// Check a username and yield results as they complete.
    ///
    /// Each item carries its registry index so callers can restore registry
    /// order. Suggestions are not generated; pass the collected results to
    /// [`HandleChecker::suggest`].
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use futures_util::StreamExt;
    /// use handle_scout_lib::HandleChecker;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let checker = HandleChecker::new()?;
    ///     let mut stream = checker.check_handle_stream("octocat")?;
    ///     while let Some((_, result)) = stream.next().await {
    ///         println!("{}: {}", result.platform, result.status);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub fn check_handle_stream<'a>(
        &'a self,
        username: &'a str,
    ) -> Result<ProbeStream<'a>, HandleCheckError> {
        validate_username(username)?;

        let probes: Vec<_> = self
            .registry
            .iter()
            .map(move |spec| self.prober.probe(spec, username))
            .collect();

        Ok(Box::pin(
            ConcurrentProcessor::new(self.config.concurrency).stream_indexed(probes),
        ))
    }

    /// Suggestions for `username` given a full set of results.
    pub fn suggest(&self, username: &str, results: &[ProbeResult]) -> Vec<String> {
        generate_suggestions(username, results, &self.config.suggestions)
    }

    /// Get the current configuration for this checker.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Get the platforms this checker probes.
    pub fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }
}

fn count(results: &[ProbeResult], status: ProbeStatus) -> usize {
    results.iter().filter(|r| r.status == status).count()
}
