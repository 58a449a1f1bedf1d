//! Handle Scout CLI Application
//!
//! A command-line interface for checking whether a username is free across
//! popular platforms. This CLI application provides a user-friendly interface
//! to the handle-scout-lib library.

mod ui;

use chrono::Utc;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use console::style;
use futures_util::StreamExt;
use handle_scout_lib::{load_env_config, parse_timeout_string, ConfigManager, EnvConfig, FileConfig};
use handle_scout_lib::{
    CheckBatch, CheckConfig, HandleCheckError, HandleChecker, PlatformRegistry, ProbeResult,
    ProbeStatus, SuggestionPolicy,
};
use std::io::Write;
use std::process;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Exit status for a rejected username.
const EXIT_INVALID_USERNAME: i32 = 2;

/// Highest accepted `--suggestion-cap`.
const MAX_SUGGESTION_CAP: usize = 100;

/// CLI arguments for handle-scout
#[derive(Parser, Debug)]
#[command(name = "handle-scout")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check username availability across popular platforms")]
#[command(
    long_about = "Check whether a username is free on popular developer and social platforms.\n\nEvery platform is probed concurrently. Results are best-effort: a platform can\nanswer available, taken, unknown (blocked, rate-limited, ambiguous) or error.\nWithout usernames, an interactive prompt is started."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Usernames to check (2-30 letters, digits, '_' or '.')
    #[arg(value_name = "USERNAMES", help_heading = "Username Selection")]
    pub usernames: Vec<String>,

    /// List the configured platforms and exit
    #[arg(long = "list-platforms", help_heading = "Username Selection")]
    pub list_platforms: bool,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Show a header, progress and summary around the results
    #[arg(short = 'p', long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Show results as each platform answers
    #[arg(long = "streaming", help_heading = "Output Format")]
    pub streaming: bool,

    /// Per-request timeout (e.g. "6s", "500ms", "1m")
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "DURATION",
        help_heading = "Performance"
    )]
    pub timeout: Option<String>,

    /// Max platforms probed at once (default: 32, max: 100)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub concurrency: Option<usize>,

    /// Do not suggest alternate handles
    #[arg(long = "no-suggestions", help_heading = "Suggestions")]
    pub no_suggestions: bool,

    /// Maximum number of suggestions (default: 18)
    #[arg(long = "suggestion-cap", value_name = "N", help_heading = "Suggestions")]
    pub suggestion_cap: Option<usize>,

    /// Only suggest when one of these platforms is not available (comma-separated)
    #[arg(
        long = "key-platform",
        value_name = "PLATFORM",
        value_delimiter = ',',
        action = clap::ArgAction::Append,
        help_heading = "Suggestions"
    )]
    pub key_platforms: Option<Vec<String>>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show HTTP status, timing and reason for every platform; debug logging
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Effective settings after config files, environment and CLI flags.
#[derive(Debug, Clone)]
struct Settings {
    check: CheckConfig,
    registry: PlatformRegistry,
    json: bool,
    pretty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            check: CheckConfig::default(),
            registry: PlatformRegistry::builtin(),
            json: false,
            pretty: false,
        }
    }
}

/// Error statistics for aggregated reporting
#[derive(Debug, Default)]
pub(crate) struct ErrorStats {
    pub(crate) timeouts: Vec<String>,
    pub(crate) network_errors: Vec<String>,
    pub(crate) other_errors: Vec<String>,
}

impl ErrorStats {
    fn from_results(results: &[ProbeResult]) -> Self {
        let mut stats = Self::default();
        for result in results {
            stats.add_result(result);
        }
        stats
    }

    fn add_result(&mut self, result: &ProbeResult) {
        if result.status != ProbeStatus::Error {
            return;
        }
        let platform = result.platform.clone();
        match result.reason.as_str() {
            "timeout" => self.timeouts.push(platform),
            "connection failed" => self.network_errors.push(platform),
            _ => self.other_errors.push(platform),
        }
    }

    fn has_errors(&self) -> bool {
        !self.timeouts.is_empty() || !self.network_errors.is_empty() || !self.other_errors.is_empty()
    }
}

/// Initialize the tracing subscriber for logging.
///
/// `--debug` and `--verbose` win over `RUST_LOG`. Logs go to stderr so
/// stdout stays clean for JSON.
fn init_tracing(args: &Args) {
    let filter = if args.debug {
        EnvFilter::new("handle_scout=debug,handle_scout_lib=debug")
    } else if args.verbose {
        EnvFilter::new("handle_scout=info,handle_scout_lib=info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(&args);

    debug!("handle-scout starting with args: {:?}", args);

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    match run_handle_scout(args).await {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    // --list-platforms is self-contained, skip other validation
    if args.list_platforms {
        return Ok(());
    }

    // Streaming mode doesn't support structured output
    if args.streaming && args.json {
        return Err("Cannot use --streaming with --json".to_string());
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Concurrency must be between 1 and 100".to_string());
        }
    }

    if let Some(cap) = args.suggestion_cap {
        if cap > MAX_SUGGESTION_CAP {
            return Err(format!(
                "Suggestion cap must be at most {}",
                MAX_SUGGESTION_CAP
            ));
        }
    }

    if let Some(timeout) = &args.timeout {
        if parse_timeout_string(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '6s', '500ms', '1m'",
                timeout
            ));
        }
    }

    if args.no_suggestions && (args.suggestion_cap.is_some() || args.key_platforms.is_some()) {
        return Err(
            "Cannot combine --no-suggestions with --suggestion-cap or --key-platform".to_string(),
        );
    }

    Ok(())
}

/// Main handle checking logic.
///
/// Returns the process exit status.
async fn run_handle_scout(mut args: Args) -> Result<i32, Box<dyn std::error::Error>> {
    let settings = build_settings(&args)?;

    // Propagate resolved output settings back to args for display logic
    args.json = settings.json;
    args.pretty = settings.pretty;

    if args.list_platforms {
        ui::print_platforms(&settings.registry);
        return Ok(0);
    }

    let checker = HandleChecker::with_config(settings.check, settings.registry)?;

    if args.usernames.is_empty() {
        run_interactive(&checker, &args).await?;
        return Ok(0);
    }

    let mut exit_code = 0;
    let mut batches = Vec::new();

    for username in &args.usernames {
        match check_username(&checker, username.trim(), &args).await {
            Ok(batch) => batches.push(batch),
            Err(e) if e.is_user_input() => {
                eprintln!("Error: {}", e);
                exit_code = EXIT_INVALID_USERNAME;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if args.json && !batches.is_empty() {
        display_json_results(&batches)?;
    }

    Ok(exit_code)
}

/// Prompt for usernames until `q`, `quit`, `exit` or end of input.
async fn run_interactive(
    checker: &HandleChecker,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    if !args.json {
        println!(
            "{} {}",
            style("handle-scout").bold(),
            style("interactive mode. Enter a username, or q to quit.").dim()
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if !args.json {
            print!("{} ", style("username>").cyan().bold());
            std::io::stdout().flush()?;
        }

        // End of input
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "q" | "quit" | "exit") {
            break;
        }

        match check_username(checker, input, args).await {
            Ok(batch) => {
                if args.json {
                    display_json_results(std::slice::from_ref(&batch))?;
                }
            }
            Err(e) if e.is_user_input() => eprintln!("Error: {}", e),
            Err(e) => return Err(e.into()),
        }

        if !args.json {
            println!();
        }
    }

    Ok(())
}

/// Check one username with the output mode selected by `args`.
async fn check_username(
    checker: &HandleChecker,
    username: &str,
    args: &Args,
) -> Result<CheckBatch, HandleCheckError> {
    if should_use_streaming(args) {
        run_streaming_check(checker, username, args).await
    } else {
        run_batch_check(checker, username, args).await
    }
}

/// Determine whether to use streaming or batch mode
fn should_use_streaming(args: &Args) -> bool {
    args.streaming && !args.json
}

/// Run a check in streaming mode, printing rows as platforms answer
async fn run_streaming_check(
    checker: &HandleChecker,
    username: &str,
    args: &Args,
) -> Result<CheckBatch, HandleCheckError> {
    let total = checker.registry().len();
    let mut stream = checker.check_handle_stream(username)?;

    if args.pretty {
        ui::print_header(username, total, checker.config().concurrency);
    } else if args.verbose {
        info!(username, platforms = total, "streaming check");
    }

    let start_time = Instant::now();
    let mut slots: Vec<Option<ProbeResult>> = vec![None; total];
    let mut completed = 0usize;

    ui::print_table_header();
    while let Some((index, result)) = stream.next().await {
        completed += 1;
        ui::print_result(&result, args.debug, Some((completed, total)));
        if let Some(slot) = slots.get_mut(index) {
            *slot = Some(result);
        }
    }

    // Registry order for the summary and suggestions
    let results: Vec<ProbeResult> = slots
        .into_iter()
        .zip(checker.registry().iter())
        .map(|(slot, spec)| {
            slot.unwrap_or_else(|| {
                ProbeResult::failed(&spec.name, None, None, "probe did not complete")
            })
        })
        .collect();

    let suggestions = checker.suggest(username, &results);
    let batch = CheckBatch {
        username: username.to_string(),
        checked_at: Utc::now(),
        results,
        suggestions,
    };

    print_footer(&batch, start_time.elapsed(), args);
    Ok(batch)
}

/// Run a check in batch mode (collect all results first)
async fn run_batch_check(
    checker: &HandleChecker,
    username: &str,
    args: &Args,
) -> Result<CheckBatch, HandleCheckError> {
    // Validate before the spinner so a bad username prints nothing else
    handle_scout_lib::validate_username(username)?;

    if args.pretty && !args.json {
        ui::print_header(
            username,
            checker.registry().len(),
            checker.config().concurrency,
        );
    }

    let spinner = if !args.json {
        ui::Spinner::start(format!(
            "Checking @{} on {} platforms...",
            username,
            checker.registry().len()
        ))
    } else {
        None
    };

    let start_time = Instant::now();
    let batch = checker.check_handle(username).await;
    let duration = start_time.elapsed();

    // Stop spinner before printing results
    if let Some(s) = spinner {
        s.stop().await;
    }

    let batch = batch?;
    if !args.json {
        display_text_results(&batch, args, duration);
    }

    Ok(batch)
}

/// Build effective settings from config files, environment and CLI arguments.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (HS_*)
/// 3. Local config file (./handle-scout.toml)
/// 4. Global config file (~/.handle-scout.toml)
/// 5. XDG config file (~/.config/handle-scout/config.toml)
/// 6. Built-in defaults
fn build_settings(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = Settings::default();
    let config_manager = ConfigManager::new();
    let env_config = load_env_config();

    // Step 1: Determine config file path and load config files
    let explicit_path = args.config.as_ref().or(env_config.config.as_ref());
    if let Some(path) = explicit_path {
        info!("using explicit config file: {}", path);
        let file_config = config_manager
            .load_file(path)
            .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?;
        settings = merge_file_config(settings, file_config)?;
    } else {
        debug!("discovering config files");
        match config_manager.discover_and_load() {
            Ok(file_config) => settings = merge_file_config(settings, file_config)?,
            Err(e) => warn!("config discovery warning: {}", e),
        }
    }

    // Step 2: Apply environment variables (HS_*)
    settings = apply_environment_config(settings, &env_config);

    // Step 3: Apply CLI arguments (highest precedence)
    settings = apply_cli_args(settings, args)?;

    Ok(settings)
}

/// Merge a FileConfig into the settings
fn merge_file_config(
    mut settings: Settings,
    file_config: FileConfig,
) -> Result<Settings, HandleCheckError> {
    if let Some(defaults) = file_config.defaults {
        if let Some(concurrency) = defaults.concurrency {
            settings.check = settings.check.with_concurrency(concurrency);
        }
        if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
            settings.check = settings.check.with_timeout(timeout);
        }
        if let Some(user_agent) = defaults.user_agent {
            settings.check = settings.check.with_user_agent(user_agent);
        }
        if let Some(json) = defaults.json {
            settings.json = json;
        }
        if let Some(pretty) = defaults.pretty {
            settings.pretty = pretty;
        }
    }

    if let Some(suggestions) = file_config.suggestions {
        settings.check.suggestions = suggestions.apply(settings.check.suggestions)?;
    }

    if let Some(platforms) = file_config.platforms {
        settings.registry = platforms.build_registry()?;
    }

    Ok(settings)
}

/// Apply HS_* environment variables.
///
/// Values were validated by `load_env_config`; invalid ones are already dropped.
fn apply_environment_config(mut settings: Settings, env_config: &EnvConfig) -> Settings {
    if let Some(concurrency) = env_config.concurrency {
        settings.check = settings.check.with_concurrency(concurrency);
    }
    if let Some(timeout) = env_config.timeout.as_deref().and_then(parse_timeout_string) {
        settings.check = settings.check.with_timeout(timeout);
    }
    if let Some(user_agent) = &env_config.user_agent {
        settings.check = settings.check.with_user_agent(user_agent.clone());
    }
    if let Some(cap) = env_config.suggestion_cap {
        settings.check.suggestions.cap = cap;
    }
    if let Some(json) = env_config.json {
        settings.json = json;
    }
    if let Some(pretty) = env_config.pretty {
        settings.pretty = pretty;
    }
    settings
}

/// Apply CLI arguments to settings (highest precedence).
///
/// Boolean flags only override when passed; their absence keeps config and env values.
fn apply_cli_args(mut settings: Settings, args: &Args) -> Result<Settings, String> {
    if let Some(concurrency) = args.concurrency {
        settings.check = settings.check.with_concurrency(concurrency);
    }

    if let Some(timeout_str) = &args.timeout {
        let timeout = parse_timeout_string(timeout_str).ok_or_else(|| {
            format!(
                "Invalid timeout '{}'. Use format like '6s', '500ms', '1m'",
                timeout_str
            )
        })?;
        settings.check = settings.check.with_timeout(timeout);
    }

    if args.no_suggestions {
        settings.check.suggestions.enabled = false;
    }
    if let Some(cap) = args.suggestion_cap {
        settings.check.suggestions.cap = cap;
    }
    if let Some(keys) = &args.key_platforms {
        for key in keys {
            if settings.registry.get(key).is_none() {
                warn!("key platform '{}' is not a configured platform", key);
            }
        }
        settings.check.suggestions.policy = SuggestionPolicy::KeyPlatforms(keys.clone());
    }

    if args.json {
        settings.json = true;
    }
    if args.pretty {
        settings.pretty = true;
    }

    Ok(settings)
}

/// Display results in JSON format: one object, or an array for several usernames
fn display_json_results(batches: &[CheckBatch]) -> Result<(), Box<dyn std::error::Error>> {
    let json = match batches {
        [single] => serde_json::to_string_pretty(single)?,
        _ => serde_json::to_string_pretty(batches)?,
    };
    println!("{}", json);
    Ok(())
}

/// Display results in human-readable table format
fn display_text_results(batch: &CheckBatch, args: &Args, duration: std::time::Duration) {
    ui::print_results_table(&batch.results, args.debug);
    print_footer(batch, duration, args);
}

/// Summary, error summary and suggestions shared by both modes.
fn print_footer(batch: &CheckBatch, duration: std::time::Duration, args: &Args) {
    if args.pretty || batch.results.len() > 1 {
        println!();
        ui::print_summary(batch, duration);
    }

    let error_stats = ErrorStats::from_results(&batch.results);
    if error_stats.has_errors() && (args.pretty || args.verbose || args.debug) {
        println!();
        ui::print_error_summary(&error_stats);
    }

    println!();
    ui::print_suggestions(batch);
}

// handle-scout/src/main.rs tests module
