//! Colored console output for engine events.
//!
//! Provides a `tracing` layer that formats sampler, volume and fitness
//! events emitted by the `regionfit*` crates. Output goes to stderr so that
//! command output on stdout stays machine-readable.
//!
//! ## Log Levels
//!
//! - **INFO**: Session start, finished samples, volume estimates, scored populations
//! - **DEBUG**: Per-candidate fitness, chain restarts, volume fallbacks, solver calls
//! - **TRACE**: Accepted hit-and-run steps
//!
//! `WARN` events (failed candidates and compilations) are always shown.

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();
static SESSION_START_NANOS: AtomicU64 = AtomicU64::new(0);

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directives used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVES: &str = "regionfit=info";

/// Initializes console output with [`DEFAULT_DIRECTIVES`].
///
/// Safe to call multiple times - only the first call has effect.
pub fn init() {
    init_with_default(DEFAULT_DIRECTIVES);
}

/// Initializes console output, falling back to `directives` when `RUST_LOG`
/// is unset or invalid.
///
/// Safe to call multiple times - only the first call has effect.
pub fn init_with_default(directives: &str) {
    INIT.get_or_init(|| {
        print_banner();

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(directives));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(EngineConsoleLayer)
            .try_init();
    });
}

fn mark_session_start() {
    let epoch = EPOCH.get_or_init(Instant::now);
    let nanos = epoch.elapsed().as_nanos() as u64;
    SESSION_START_NANOS.store(nanos, Ordering::Relaxed);
}

fn elapsed_secs() -> f64 {
    let Some(epoch) = EPOCH.get() else {
        return 0.0;
    };
    let start_nanos = SESSION_START_NANOS.load(Ordering::Relaxed);
    let now_nanos = epoch.elapsed().as_nanos() as u64;
    now_nanos.saturating_sub(start_nanos) as f64 / 1_000_000_000.0
}

fn print_banner() {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(
        stderr,
        "{} {}",
        "RegionFit".bright_cyan().bold(),
        format!("v{VERSION} - constraint-region sampling & fitness").bright_white()
    );
    let _ = stderr.flush();
}

/// A tracing layer that formats engine events with colors.
pub struct EngineConsoleLayer;

impl<S: Subscriber> Layer<S> for EngineConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("regionfit") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor, *metadata.level());
        if !output.is_empty() {
            let _ = writeln!(io::stderr(), "{}", output);
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    event: Option<String>,
    sampler: Option<String>,
    method: Option<String>,
    heuristic: Option<String>,
    distribution: Option<String>,
    volume_strategy: Option<String>,
    error: Option<String>,
    source: Option<String>,
    requested: Option<u64>,
    returned: Option<u64>,
    budget_used: Option<u64>,
    restarts: Option<u64>,
    collected: Option<u64>,
    candidates: Option<u64>,
    threads: Option<u64>,
    invalid: Option<u64>,
    runtime_errors: Option<u64>,
    solves: Option<u64>,
    found: Option<u64>,
    rows: Option<u64>,
    positives: Option<u64>,
    draws: Option<u64>,
    elapsed_ms: Option<u64>,
    time_limit_secs: Option<u64>,
    node_limit: Option<u64>,
    seed: Option<u64>,
    exit_code: Option<i64>,
    probability: Option<f64>,
    recall: Option<f64>,
    precision: Option<f64>,
    fitness: Option<f64>,
    best: Option<f64>,
}

fn unquote(value: &dyn std::fmt::Debug) -> String {
    format!("{:?}", value).trim_matches('"').to_string()
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "event" => self.event = Some(unquote(value)),
            "sampler" => self.sampler = Some(unquote(value)),
            "method" => self.method = Some(unquote(value)),
            "heuristic" => self.heuristic = Some(unquote(value)),
            "distribution" => self.distribution = Some(unquote(value)),
            "volume_strategy" => self.volume_strategy = Some(unquote(value)),
            "error" => self.error = Some(unquote(value)),
            "source" => self.source = Some(unquote(value)),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "requested" => self.requested = Some(value),
            "returned" => self.returned = Some(value),
            "budget_used" => self.budget_used = Some(value),
            "restarts" => self.restarts = Some(value),
            "collected" => self.collected = Some(value),
            "candidates" => self.candidates = Some(value),
            "threads" => self.threads = Some(value),
            "invalid" => self.invalid = Some(value),
            "runtime_errors" => self.runtime_errors = Some(value),
            "solves" => self.solves = Some(value),
            "found" => self.found = Some(value),
            "rows" => self.rows = Some(value),
            "positives" => self.positives = Some(value),
            "draws" => self.draws = Some(value),
            "elapsed_ms" => self.elapsed_ms = Some(value),
            "time_limit_secs" => self.time_limit_secs = Some(value),
            "node_limit" => self.node_limit = Some(value),
            "seed" => self.seed = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        match field.name() {
            "exit_code" => self.exit_code = Some(value),
            _ => self.record_u64(field, value.max(0) as u64),
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        match field.name() {
            "probability" => self.probability = Some(value),
            "recall" => self.recall = Some(value),
            "precision" => self.precision = Some(value),
            "fitness" => self.fitness = Some(value),
            "best" => self.best = Some(value),
            _ => {}
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "event" => self.event = Some(value.to_string()),
            "sampler" => self.sampler = Some(value.to_string()),
            "method" => self.method = Some(value.to_string()),
            "heuristic" => self.heuristic = Some(value.to_string()),
            "distribution" => self.distribution = Some(value.to_string()),
            "volume_strategy" => self.volume_strategy = Some(value.to_string()),
            "error" => self.error = Some(value.to_string()),
            "source" => self.source = Some(value.to_string()),
            _ => {}
        }
    }
}

fn format_event(v: &EventVisitor, level: Level) -> String {
    match v.event.as_deref().unwrap_or("") {
        "session_start" => format_session_start(v),
        "sampling_complete" => format_sampling_complete(v),
        "chain_restart" => format_chain_restart(v),
        "step_accepted" => format_step_accepted(v, level),
        "volume_estimated" => format_volume_estimated(v),
        "volume_fallback" => format_volume_fallback(v),
        "fitness_evaluated" => format_fitness_evaluated(v),
        "population_scored" => format_population_scored(v),
        "dataset_generated" => format_dataset_generated(v),
        "oracle_call" => format_oracle_call(v),
        "candidate_failed" | "compile_failed" => format_failure(v),
        _ => String::new(),
    }
}

fn format_elapsed() -> String {
    format!("{:>7.3}s", elapsed_secs())
        .bright_black()
        .to_string()
}

fn count(value: Option<u64>) -> String {
    value.unwrap_or(0).to_formatted_string(&Locale::en)
}

fn format_session_start(v: &EventVisitor) -> String {
    mark_session_start();
    let mut output = format!(
        "{} {} Session │ {}s limit │ {} nodes │ sampler {} │ volume {}",
        format_elapsed(),
        "▶".bright_green().bold(),
        count(v.time_limit_secs).bright_yellow(),
        count(v.node_limit).bright_yellow(),
        v.sampler.as_deref().unwrap_or("auto").white().bold(),
        v.volume_strategy.as_deref().unwrap_or("-").white().bold(),
    );
    if let Some(seed) = v.seed {
        output.push_str(&format!(" │ seed {}", seed.bright_magenta()));
    }
    output
}

fn format_sampling_complete(v: &EventVisitor) -> String {
    let requested = v.requested.unwrap_or(0);
    let returned = v.returned.unwrap_or(0);
    let filled = if returned >= requested {
        count(v.returned).bright_green().to_string()
    } else {
        count(v.returned).yellow().to_string()
    };

    let mut output = format!(
        "{} {} {} │ {}/{} points",
        format_elapsed(),
        "■".bright_cyan().bold(),
        v.sampler.as_deref().unwrap_or("sampler").white().bold(),
        filled,
        count(v.requested),
    );
    if let Some(budget_used) = v.budget_used {
        output.push_str(&format!(
            " │ {} steps",
            budget_used.to_formatted_string(&Locale::en).white()
        ));
    }
    if let Some(restarts) = v.restarts.filter(|&r| r > 0) {
        output.push_str(&format!(
            " │ {} restarts",
            restarts.to_formatted_string(&Locale::en).bright_magenta()
        ));
    }
    output
}

fn format_chain_restart(v: &EventVisitor) -> String {
    format!(
        "{} {} Chain restart #{} │ {} collected",
        format_elapsed(),
        "↻".yellow(),
        count(v.restarts),
        count(v.collected),
    )
}

fn format_step_accepted(v: &EventVisitor, level: Level) -> String {
    if level != Level::TRACE {
        return String::new();
    }
    format!(
        "{} {} Step accepted │ {} collected",
        format_elapsed(),
        "✓".bright_green(),
        count(v.collected).bright_black(),
    )
}

fn format_volume_estimated(v: &EventVisitor) -> String {
    format!(
        "{} {} Volume {} │ {}",
        format_elapsed(),
        "■".bright_cyan().bold(),
        format_probability(v.probability.unwrap_or(0.0)),
        v.method.as_deref().unwrap_or("-").white().bold(),
    )
}

fn format_volume_fallback(v: &EventVisitor) -> String {
    format!(
        "{} {} {} estimate {} below floor, enumerating",
        format_elapsed(),
        "↓".yellow(),
        v.heuristic.as_deref().unwrap_or("heuristic").white(),
        format_probability(v.probability.unwrap_or(0.0)),
    )
}

fn format_fitness_evaluated(v: &EventVisitor) -> String {
    let mut output = format!(
        "{} {} recall {}",
        format_elapsed(),
        "◆".bright_blue(),
        format_ratio(v.recall.unwrap_or(0.0)),
    );
    if let Some(precision) = v.precision {
        output.push_str(&format!(" │ precision {}", format_ratio(precision)));
    }
    output.push_str(&format!(
        " │ fitness {}",
        format_fitness(v.fitness.unwrap_or(0.0))
    ));
    output
}

fn format_population_scored(v: &EventVisitor) -> String {
    let mut output = format!(
        "{} {} {} candidates on {} │ {} threads │ best {}",
        format_elapsed(),
        "■".bright_cyan().bold(),
        count(v.candidates).bright_yellow(),
        v.distribution.as_deref().unwrap_or("training").white().bold(),
        count(v.threads),
        format_fitness(v.best.unwrap_or(0.0)),
    );
    let invalid = v.invalid.unwrap_or(0);
    let runtime_errors = v.runtime_errors.unwrap_or(0);
    if invalid + runtime_errors > 0 {
        output.push_str(&format!(
            " │ {} invalid │ {} failed to compile",
            invalid.to_formatted_string(&Locale::en).yellow(),
            runtime_errors.to_formatted_string(&Locale::en).yellow(),
        ));
    }
    output
}

fn format_dataset_generated(v: &EventVisitor) -> String {
    format!(
        "{} {} Dataset │ {} rows │ {} positive │ {} draws",
        format_elapsed(),
        "■".bright_cyan().bold(),
        count(v.rows).bright_yellow(),
        count(v.positives).bright_green(),
        count(v.draws),
    )
}

fn format_oracle_call(v: &EventVisitor) -> String {
    let mut output = format!(
        "{} {} Solver │ {} solves",
        format_elapsed(),
        "·".bright_black(),
        count(v.solves),
    );
    if let Some(found) = v.found {
        output.push_str(&format!(
            " │ {} pooled",
            found.to_formatted_string(&Locale::en)
        ));
    }
    output.push_str(&format!(
        " │ {}",
        format_duration_ms(v.elapsed_ms.unwrap_or(0)).yellow()
    ));
    output
}

fn format_failure(v: &EventVisitor) -> String {
    let mut output = format!("{} {}", format_elapsed(), "✗".bright_red().bold());
    match v.event.as_deref() {
        Some("compile_failed") => {
            output.push_str(&format!(
                " Compilation failed │ {}",
                v.source.as_deref().unwrap_or("-").white()
            ));
            if let Some(code) = v.exit_code {
                output.push_str(&format!(" │ exit {}", code.bright_red()));
            }
        }
        _ => {
            output.push_str(&format!(
                " Candidate failed │ {}",
                v.error.as_deref().unwrap_or("unknown error").bright_red()
            ));
        }
    }
    output
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

fn format_probability(p: f64) -> String {
    let text = if p > 0.0 && p < 1e-3 {
        format!("{:.3e}", p)
    } else {
        format!("{:.4}", p)
    };
    if p <= 0.0 {
        text.bright_red().to_string()
    } else {
        text.bright_green().to_string()
    }
}

fn format_ratio(r: f64) -> String {
    let text = format!("{:.3}", r);
    if r >= 0.9 {
        text.bright_green().to_string()
    } else if r > 0.0 {
        text.yellow().to_string()
    } else {
        text.bright_red().to_string()
    }
}

fn format_fitness(f: f64) -> String {
    let text = format!("{:.6}", f);
    if f > 0.0 {
        text.bright_green().bold().to_string()
    } else {
        text.bright_red().to_string()
    }
}
