//! capcalc - brain state dynamics from per-timepoint cluster labels
//!
//! The main entry point for capcalc, handling:
//! - State filtering of a label sequence
//! - Transition, occupancy and run-length statistics for batches of subjects
//! - Configuration inspection and validation

use cap_config::{
    list_presets, load_config, ConfigOverrides, PresetName, ResolvedConfig, ValidationError,
};
use cap_core::batch::run_batch;
use cap_core::exit_codes::ExitCode;
use cap_core::labels::{read_labels, LabelFileError};
use cap_core::log_event;
use cap_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, Stage,
};
use cap_core::output::{
    render_filter, render_stats, FilterReport, OutputFormat, StatsReport, TracedIndex,
    SCHEMA_VERSION,
};
use cap_math::{FilterTrace, Label, StateError, StateFilter};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

/// capcalc - filter state label sequences and summarize state dynamics
#[derive(Parser)]
#[command(name = "capcalc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Analysis config file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Named threshold preset (passthrough, smoothed); replaces config file discovery
    #[arg(long, global = true)]
    preset: Option<PresetName>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter a label sequence, patching and filling short state runs
    Filter(FilterArgs),

    /// Compute transition matrix and per-state run statistics for label files
    Stats(StatsArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct FilterArgs {
    /// Label file (whitespace-separated integers)
    file: PathBuf,

    /// Patch runs shorter than this that return to the previous state
    #[arg(long, visible_alias = "minout")]
    minlength: Option<usize>,

    /// Fill runs shorter than this that move on to another state
    #[arg(long)]
    minhold: Option<usize>,

    /// Include the decision taken at every index
    #[arg(long)]
    trace: bool,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Label files, one subject each
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Number of states in the label range
    #[arg(long)]
    numlabels: Option<usize>,

    /// Smallest label of the range
    #[arg(long, allow_hyphen_values = true)]
    minlabel: Option<i64>,

    /// Patch threshold of the filter pre-stage
    #[arg(long, visible_alias = "minlength")]
    minout: Option<usize>,

    /// Fill threshold of the filter pre-stage
    #[arg(long)]
    minhold: Option<usize>,

    /// Write <root>_statestats.txt, <root>_transmat.txt and <root>_runlengths.txt
    #[arg(long)]
    output_root: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration and where it came from
    Show,
    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the resolved config)
        path: Option<PathBuf>,
    },
    /// List threshold presets
    Presets,
}

fn main() {
    let cli = Cli::parse();

    let cli_level = LogConfig::cli_level(cli.global.verbose, cli.global.quiet);
    let log_config = LogConfig::from_env(cli_level, cli.global.log_format);
    init_logging(&log_config);

    let ctx = LogContext::new(generate_run_id());
    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_STARTED,
        Stage::Init,
        "capcalc started",
        version = env!("CARGO_PKG_VERSION")
    );

    let exit_code = match &cli.command {
        Commands::Filter(args) => run_filter(&cli.global, &ctx, args),
        Commands::Stats(args) => run_stats(&cli.global, &ctx, args),
        Commands::Config(args) => run_config(&cli.global, &ctx, args),
        Commands::Version => print_version(&cli.global),
    };

    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_FINISHED,
        Stage::Write,
        "capcalc finished",
        exit_code = exit_code.as_i32()
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// filter
// ============================================================================

fn run_filter(global: &GlobalOpts, ctx: &LogContext, args: &FilterArgs) -> ExitCode {
    let overrides = ConfigOverrides {
        minlength: args.minlength,
        minhold: args.minhold,
        ..ConfigOverrides::default()
    };
    let resolved = match resolve(global, ctx, &overrides) {
        Ok(resolved) => resolved,
        Err(code) => return code,
    };

    let labels = match read_labels(&args.file) {
        Ok(labels) => labels,
        Err(e) => return output_label_error(global, ctx, &e),
    };
    log_event!(
        ctx,
        DEBUG,
        event_names::LABELS_LOADED,
        Stage::Load,
        "labels loaded",
        timepoints = labels.len()
    );

    let filter = match resolved.config.thresholds().and_then(StateFilter::new) {
        Ok(filter) => filter,
        Err(e) => return output_state_error(global, ctx, &e),
    };
    let trace = match filter.trace(&labels) {
        Ok(trace) => trace,
        Err(e) => return output_state_error(global, ctx, &e),
    };

    let report = filter_report(ctx, args, &labels, filter, trace);
    log_event!(
        ctx,
        INFO,
        event_names::FILTER_FINISHED,
        Stage::Filter,
        "labels filtered",
        timepoints = report.timepoints,
        changed = report.changed
    );

    match render_filter(&report, global.format) {
        Ok(text) => {
            print!("{}", text);
            ExitCode::Clean
        }
        Err(e) => output_internal_error(global, ctx, &e.to_string()),
    }
}

fn filter_report(
    ctx: &LogContext,
    args: &FilterArgs,
    labels: &[Label],
    filter: StateFilter,
    trace: FilterTrace,
) -> FilterReport {
    let changed = trace.changed_indices(labels).len();
    let counts = args.trace.then(|| trace.counts());
    let steps = args.trace.then(|| {
        trace
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| TracedIndex {
                index,
                label: labels[index],
                filtered: trace.filtered[index],
                step: *step,
            })
            .collect()
    });

    FilterReport {
        schema_version: SCHEMA_VERSION,
        run_id: ctx.run_id.clone(),
        generated_at: chrono::Utc::now(),
        source: args.file.display().to_string(),
        thresholds: filter.thresholds(),
        timepoints: labels.len(),
        changed,
        filtered: trace.filtered,
        counts,
        trace: steps,
    }
}

// ============================================================================
// stats
// ============================================================================

fn run_stats(global: &GlobalOpts, ctx: &LogContext, args: &StatsArgs) -> ExitCode {
    let overrides = ConfigOverrides {
        numlabels: args.numlabels,
        minlabel: args.minlabel,
        minlength: args.minout,
        minhold: args.minhold,
    };
    let resolved = match resolve(global, ctx, &overrides) {
        Ok(resolved) => resolved,
        Err(code) => return code,
    };

    let outcome = run_batch(
        &args.files,
        &resolved.config,
        args.output_root.as_deref(),
        ctx,
    );
    let exit_code = outcome.exit_code();

    let report = StatsReport {
        schema_version: SCHEMA_VERSION,
        run_id: ctx.run_id.clone(),
        generated_at: chrono::Utc::now(),
        config: resolved.snapshot(),
        subjects: outcome.subjects,
        failures: outcome.failures,
    };

    match render_stats(&report, global.format) {
        Ok(text) => {
            print!("{}", text);
            exit_code
        }
        Err(e) => output_internal_error(global, ctx, &e.to_string()),
    }
}

// ============================================================================
// config
// ============================================================================

fn run_config(global: &GlobalOpts, ctx: &LogContext, args: &ConfigArgs) -> ExitCode {
    match &args.command {
        ConfigCommands::Show => run_config_show(global, ctx),
        ConfigCommands::Validate { path } => run_config_validate(global, ctx, path.as_ref()),
        ConfigCommands::Presets => run_config_presets(global, ctx),
    }
}

/// Display the effective configuration (including defaults if no file is present).
fn run_config_show(global: &GlobalOpts, ctx: &LogContext) -> ExitCode {
    let resolved = match resolve(global, ctx, &ConfigOverrides::default()) {
        Ok(resolved) => resolved,
        Err(code) => return code,
    };

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "source": resolved.snapshot(),
                "config": resolved.config,
            });
            print_json(global, ctx, &response)
        }
        OutputFormat::Summary => {
            println!(
                "[{}] config: {} (minlength={}, minhold={})",
                ctx.run_id,
                resolved.source,
                resolved.config.filter.minlength,
                resolved.config.filter.minhold
            );
            ExitCode::Clean
        }
        OutputFormat::Md | OutputFormat::Text => {
            let toml = match resolved.config.to_toml_string() {
                Ok(toml) => toml,
                Err(e) => return output_internal_error(global, ctx, &e.to_string()),
            };
            if global.format == OutputFormat::Md {
                println!("# capcalc configuration");
                println!();
                println!("Source: {}", describe_source(&resolved));
                println!();
                println!("```toml");
                print!("{}", toml);
                println!("```");
            } else {
                println!("# source: {}", describe_source(&resolved));
                print!("{}", toml);
            }
            ExitCode::Clean
        }
    }
}

fn describe_source(resolved: &ResolvedConfig) -> String {
    match &resolved.path {
        Some(path) => format!("{} ({})", resolved.source, path.display()),
        None => resolved.source.to_string(),
    }
}

fn run_config_validate(global: &GlobalOpts, ctx: &LogContext, path: Option<&PathBuf>) -> ExitCode {
    let cli_path = path.or(global.config.as_ref());
    let preset = if cli_path.is_some() { None } else { global.preset };
    let resolved = match load_config(cli_path.map(PathBuf::as_path), preset, &ConfigOverrides::default()) {
        Ok(resolved) => resolved,
        Err(e) => return output_config_error(global, ctx, &e),
    };

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "valid",
                "source": resolved.snapshot(),
            });
            print_json(global, ctx, &response)
        }
        OutputFormat::Summary => {
            println!("[{}] config validate: OK", ctx.run_id);
            ExitCode::Clean
        }
        _ => {
            println!("# Configuration Validation");
            println!();
            println!("Status: valid");
            println!("Source: {}", describe_source(&resolved));
            ExitCode::Clean
        }
    }
}

fn run_config_presets(global: &GlobalOpts, ctx: &LogContext) -> ExitCode {
    let presets = list_presets();
    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "presets": presets,
            });
            print_json(global, ctx, &response)
        }
        OutputFormat::Md => {
            println!("| preset | minlength | minhold | description |");
            println!("|---|---|---|---|");
            for p in &presets {
                println!("| {} | {} | {} | {} |", p.name, p.minlength, p.minhold, p.description);
            }
            ExitCode::Clean
        }
        _ => {
            for p in &presets {
                println!("{} minlength={} minhold={}  {}", p.name, p.minlength, p.minhold, p.description);
            }
            ExitCode::Clean
        }
    }
}

fn print_version(global: &GlobalOpts) -> ExitCode {
    match global.format {
        OutputFormat::Json => {
            let version_info = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "config_schema_version": cap_config::CONFIG_SCHEMA_VERSION,
                "capcalc_version": env!("CARGO_PKG_VERSION"),
            });
            println!("{}", version_info);
        }
        _ => {
            println!("capcalc {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
    ExitCode::Clean
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Load the configuration named by the global options plus `overrides`.
fn resolve(
    global: &GlobalOpts,
    ctx: &LogContext,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig, ExitCode> {
    match load_config(global.config.as_deref(), global.preset, overrides) {
        Ok(resolved) => {
            log_event!(
                ctx,
                DEBUG,
                event_names::CONFIG_LOADED,
                Stage::Init,
                "configuration resolved",
                source = tracing::field::display(&resolved.source),
                minlength = resolved.config.filter.minlength,
                minhold = resolved.config.filter.minhold
            );
            Ok(resolved)
        }
        Err(e) => Err(output_config_error(global, ctx, &e)),
    }
}

fn print_json<T: Serialize>(global: &GlobalOpts, ctx: &LogContext, value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::Clean
        }
        Err(e) => output_internal_error(global, ctx, &e.to_string()),
    }
}

/// Output a config error in the appropriate format.
fn output_config_error(global: &GlobalOpts, ctx: &LogContext, error: &ValidationError) -> ExitCode {
    let exit_code = match error {
        ValidationError::IoError(_) => ExitCode::IoError,
        _ => ExitCode::ArgsError,
    };
    log_event!(
        ctx,
        ERROR,
        event_names::CONFIG_ERROR,
        Stage::Init,
        "configuration rejected",
        code = error.code()
    );
    output_error(global, ctx, error.code(), "config_error", &error.to_string(), exit_code)
}

fn output_label_error(global: &GlobalOpts, ctx: &LogContext, error: &LabelFileError) -> ExitCode {
    let exit_code = if error.is_io() {
        ExitCode::IoError
    } else {
        ExitCode::InvalidLabels
    };
    output_error(global, ctx, error.code(), "label_file_error", &error.to_string(), exit_code)
}

fn output_state_error(global: &GlobalOpts, ctx: &LogContext, error: &StateError) -> ExitCode {
    let exit_code = match error {
        StateError::InvalidConfiguration { .. } => ExitCode::ArgsError,
        _ => ExitCode::InvalidLabels,
    };
    output_error(global, ctx, error.code(), error.kind(), &error.to_string(), exit_code)
}

fn output_internal_error(global: &GlobalOpts, ctx: &LogContext, message: &str) -> ExitCode {
    output_error(global, ctx, 20, "internal_error", message, ExitCode::InternalError)
}

/// Report a failure on stderr and return its exit code.
fn output_error(
    global: &GlobalOpts,
    ctx: &LogContext,
    code: u32,
    kind: &str,
    message: &str,
    exit_code: ExitCode,
) -> ExitCode {
    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "error",
                "error": {
                    "code": code,
                    "kind": kind,
                    "exit_code": exit_code.code_name(),
                    "message": message,
                }
            });
            eprintln!("{}", response);
        }
        OutputFormat::Summary => {
            eprintln!("[{}] error: {}", ctx.run_id, message);
        }
        _ => {
            eprintln!("Error: {}", message);
        }
    }
    exit_code
}
