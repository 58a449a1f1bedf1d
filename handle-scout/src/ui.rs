//! Terminal display logic for the handle-scout CLI.
//!
//! Result table, streaming result lines, spinner, summaries and the
//! platform listing. Uses only the `console` crate.

use console::{pad_str, style, Alignment, StyledObject, Term};
use handle_scout_lib::{CheckBatch, PlatformRegistry, ProbeResult, ProbeStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::ErrorStats;

const PLATFORM_WIDTH: usize = 12;
const STATUS_WIDTH: usize = 10;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a spinner with the given message, or `None` when stderr is not a terminal.
    pub fn start(message: String) -> Option<Self> {
        if !Term::stderr().is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a pretty run.
pub fn print_header(username: &str, platform_count: usize, concurrency: usize) {
    println!(
        "{} {} {}",
        style("handle-scout").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "@{} on {} platform{}",
            username,
            platform_count,
            if platform_count == 1 { "" } else { "s" }
        ))
        .dim(),
    );
    println!("{}", style(format!("Concurrency: {}", concurrency)).dim());
    println!();
}

// ── Result table ─────────────────────────────────────────────────────────────

/// Colored, fixed-width status label.
pub fn status_label(status: ProbeStatus) -> StyledObject<String> {
    let text = pad_str(
        &status.to_string().to_uppercase(),
        STATUS_WIDTH,
        Alignment::Left,
        None,
    )
    .into_owned();
    match status {
        ProbeStatus::Available => style(text).green().bold(),
        ProbeStatus::Taken => style(text).red().bold(),
        ProbeStatus::Unknown => style(text).yellow(),
        ProbeStatus::Error => style(text).magenta(),
    }
}

/// Print the column header of the result table.
pub fn print_table_header() {
    println!(
        "  {}  {}  {}",
        style(pad_str("Platform", PLATFORM_WIDTH, Alignment::Left, None)).bold(),
        style(pad_str("Status", STATUS_WIDTH, Alignment::Left, None)).bold(),
        style("Link").bold(),
    );
    println!(
        "  {}",
        style("─".repeat(PLATFORM_WIDTH + STATUS_WIDTH + 40)).dim()
    );
}

/// Print one table row.
///
/// If `counter` is Some((current, total)), a progress prefix like `[3/10]` is shown.
pub fn print_result(result: &ProbeResult, debug: bool, counter: Option<(usize, usize)>) {
    let prefix = match counter {
        Some((cur, total)) => format!("{} ", style(format!("[{}/{}]", cur, total)).dim()),
        None => String::new(),
    };

    let platform = pad_str(&result.platform, PLATFORM_WIDTH, Alignment::Left, Some(".."));
    let link = result.url.as_deref().unwrap_or("-");

    let note = match result.status {
        ProbeStatus::Unknown | ProbeStatus::Error => {
            format!("  {}", style(brief_reason(result)).dim())
        }
        _ => String::new(),
    };

    println!(
        "  {}{}  {}  {}{}",
        prefix,
        style(platform).white(),
        status_label(result.status),
        link,
        note,
    );

    if debug {
        let timing = result
            .elapsed_ms
            .map(|ms| format!("{}ms", ms))
            .unwrap_or_else(|| "not probed".to_string());
        let http = result
            .http_status
            .map(|code| format!("HTTP {}", code))
            .unwrap_or_else(|| "no response".to_string());
        println!(
            "    {} {}, {}: {}",
            style("└─").dim(),
            http,
            timing,
            result.reason,
        );
    }
}

/// Print every result of a batch as a table.
pub fn print_results_table(results: &[ProbeResult], debug: bool) {
    print_table_header();
    for result in results {
        print_result(result, debug, None);
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(batch: &CheckBatch, duration: Duration) {
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} platform{} in {:.1}s  {}  {}  {}  {}  {}  {}  {}  {}",
        style(batch.results.len()).bold(),
        if batch.results.len() == 1 { "" } else { "s" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} available", batch.count(ProbeStatus::Available))).green(),
        style("|").dim(),
        style(format!("{} taken", batch.count(ProbeStatus::Taken))).red(),
        style("|").dim(),
        style(format!("{} unknown", batch.count(ProbeStatus::Unknown))).yellow(),
        style("|").dim(),
        style(format!("{} error", batch.count(ProbeStatus::Error))).magenta(),
    );
}

/// Print alternate handles, or a note when the handle is free everywhere.
pub fn print_suggestions(batch: &CheckBatch) {
    if batch.suggestions.is_empty() {
        if batch.all_available() && !batch.results.is_empty() {
            println!(
                "  {}",
                style(format!("@{} is available everywhere", batch.username))
                    .green()
                    .bold()
            );
        }
        return;
    }

    println!("  {}", style("Suggestions:").cyan().bold());
    for chunk in batch.suggestions.chunks(6) {
        println!("    {}", chunk.join("  "));
    }
}

// ── Error summary ────────────────────────────────────────────────────────────

/// Print a categorized error summary using colors.
pub fn print_error_summary(error_stats: &ErrorStats) {
    if !error_stats.has_errors() {
        return;
    }

    println!(
        "  {}",
        style("Some platforms could not be checked:").yellow()
    );

    let categories = [
        ("timeout", &error_stats.timeouts),
        ("connection failure", &error_stats.network_errors),
        ("other error", &error_stats.other_errors),
    ];

    for (label, platforms) in categories {
        if platforms.is_empty() {
            continue;
        }
        println!(
            "  {} {} {}{}: {}",
            style("•").dim(),
            platforms.len(),
            label,
            if platforms.len() == 1 { "" } else { "s" },
            format_list(platforms, 5),
        );
    }
}

// ── Platform listing ─────────────────────────────────────────────────────────

/// Print the configured platforms, then exit.
pub fn print_platforms(registry: &PlatformRegistry) {
    println!();
    println!("{}", style("Configured Platforms:").yellow().bold());
    println!();

    for spec in registry {
        let name = style(pad_str(&spec.name, PLATFORM_WIDTH, Alignment::Left, None))
            .green()
            .bold();
        if spec.skip_check {
            println!(
                "  {}  {}  {}",
                name,
                spec.profile_url_template,
                style(format!("(not checked: {})", spec.skip_reason())).dim(),
            );
        } else {
            println!(
                "  {}  {}  {}",
                name,
                spec.profile_url_template,
                style(format!("({})", spec.method.to_uppercase())).cyan(),
            );
        }
    }

    println!();
    println!("Use: handle-scout <username>");
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Join at most `max_show` names, then "... and N more".
fn format_list(names: &[String], max_show: usize) -> String {
    if names.len() <= max_show {
        names.join(", ")
    } else {
        let shown = &names[..max_show];
        let remaining = names.len() - max_show;
        format!("{}, ... and {} more", shown.join(", "), remaining)
    }
}

/// Short parenthesized reason for unknown and error rows.
fn brief_reason(result: &ProbeResult) -> String {
    match result.status {
        ProbeStatus::Unknown | ProbeStatus::Error => format!("({})", result.reason),
        _ => String::new(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
