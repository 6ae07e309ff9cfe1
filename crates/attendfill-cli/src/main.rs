//! attendfill CLI - Attendance Template Fill Engine
//!
//! Command-line interface for filling, inspecting and generating
//! attendance templates.

mod diagnostics;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use attendfill_core::{AttendanceInput, DiagnosticEmitter, FillConfig, Period};
use attendfill_engine::{
    fill_template, inspect_template, DirectoryCatalog, Inspection, LayeredCatalog, OrientationMode,
    TemplateCatalog,
};
use attendfill_templates::BuiltinTemplate;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use diagnostics::{DiagnosticConfig, ExitCode, JsonEmitter, TerminalEmitter};

#[derive(Parser)]
#[command(name = "attendfill")]
#[command(author, version, about = "Attendance template fill engine", long_about = None)]
struct Cli {
    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Fill configuration (TOML)
    #[arg(long, value_name = "FILE", global = true, env = "ATTENDFILL_CONFIG")]
    config: Option<PathBuf>,

    /// Treat warnings as errors
    #[arg(long, global = true)]
    strict: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format for reports and diagnostics
    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a template with one employee's month
    Fill {
        /// Attendance JSON (`-` for stdin)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Template file or catalog id (defaults to the input's templateId, then skp-default)
        #[arg(short, long, value_name = "TEMPLATE")]
        template: Option<String>,

        /// Directory of custom templates, searched before the built-in ones
        #[arg(long, value_name = "DIR", env = "ATTENDFILL_TEMPLATES")]
        templates_dir: Option<PathBuf>,

        /// Output file, or directory for the generated file name
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Show how a template would be filled, without writing anything
    Inspect {
        /// Template file or catalog id
        #[arg(value_name = "TEMPLATE")]
        template: String,

        #[arg(long, value_name = "DIR", env = "ATTENDFILL_TEMPLATES")]
        templates_dir: Option<PathBuf>,

        /// Month to size the layout for (name or number)
        #[arg(long, requires = "year")]
        month: Option<String>,

        #[arg(long, requires = "month")]
        year: Option<i32>,
    },

    /// Write a built-in template
    Template {
        /// Built-in template id
        #[arg(value_name = "ID", required_unless_present = "list")]
        id: Option<String>,

        /// Output file (defaults to `<id>.xlsx`)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// List the built-in templates
        #[arg(long)]
        list: bool,
    },
}

fn main() -> Result<process::ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let diagnostic_config = DiagnosticConfig {
        strict: cli.strict,
        quiet: cli.quiet,
        sheet: None,
    };

    let code = match cli.command {
        Commands::Fill {
            input,
            template,
            templates_dir,
            output,
        } => cmd_fill(
            &input,
            template.as_deref(),
            templates_dir.as_deref(),
            output,
            &config,
            diagnostic_config,
            cli.format,
        )?,
        Commands::Inspect {
            template,
            templates_dir,
            month,
            year,
        } => {
            let period = match (month, year) {
                (Some(month), Some(year)) => Some(parse_period(&month, year)?),
                _ => None,
            };
            cmd_inspect(
                &template,
                templates_dir.as_deref(),
                period,
                &config,
                diagnostic_config,
                cli.format,
            )?
        }
        Commands::Template { id, output, list } => {
            if list {
                cmd_template_list(cli.format);
            } else if let Some(id) = id {
                cmd_template(&id, output, cli.quiet)?;
            }
            ExitCode::Success
        }
    };

    Ok(code.into())
}

/// Logs go to stderr; `RUST_LOG` overrides the `-v` level
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<FillConfig> {
    let Some(path) = path else {
        return Ok(FillConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = FillConfig::from_toml_str(&text)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn parse_period(month: &str, year: i32) -> Result<Period> {
    let Some(month_number) = Period::parse_month(month) else {
        bail!("Invalid month: {month:?}");
    };
    Period::new(year, month_number).with_context(|| format!("Invalid period: {month} {year}"))
}

/// A path to an existing file, else a catalog id
fn load_template(template: &str, templates_dir: Option<&Path>) -> Result<Vec<u8>> {
    let path = Path::new(template);
    if path.is_file() {
        debug!(path = %path.display(), "reading template file");
        return std::fs::read(path)
            .with_context(|| format!("Failed to read template {}", path.display()));
    }
    let catalog = LayeredCatalog::new(templates_dir.map(DirectoryCatalog::new));
    catalog
        .fetch(template)
        .with_context(|| format!("{template:?} is neither a template file nor a known template id"))
}

fn read_input(path: &Path) -> Result<AttendanceInput> {
    let text = if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read input from stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("Invalid attendance JSON in {}", path.display()))
}

fn output_path(output: Option<PathBuf>, filename: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(filename),
        Some(path) => path,
        None => PathBuf::from(filename),
    }
}

/// Render diagnostics and decide the exit code
fn report_diagnostics(
    diagnostics: Vec<attendfill_core::Diagnostic>,
    config: DiagnosticConfig,
    format: Format,
) -> (ExitCode, serde_json::Value) {
    match format {
        Format::Text => {
            let mut emitter = TerminalEmitter::new(std::io::stderr(), config);
            for d in diagnostics {
                emitter.emit(d);
            }
            (emitter.exit_code(), serde_json::Value::Null)
        }
        Format::Json => {
            let mut emitter = JsonEmitter::new(config);
            for d in diagnostics {
                emitter.emit(d);
            }
            (emitter.exit_code(), emitter.to_json_value())
        }
    }
}

// ============================================================================
// fill
// ============================================================================

fn cmd_fill(
    input_path: &Path,
    template: Option<&str>,
    templates_dir: Option<&Path>,
    output: Option<PathBuf>,
    config: &FillConfig,
    diagnostic_config: DiagnosticConfig,
    format: Format,
) -> Result<ExitCode> {
    let input = read_input(input_path)?;
    let template_id = template
        .map(str::to_string)
        .or_else(|| input.template_id.clone())
        .unwrap_or_else(|| BuiltinTemplate::SkpDefault.id().to_string());
    let template = load_template(&template_id, templates_dir)?;

    let filled = fill_template(&template, &input, config)
        .with_context(|| format!("Failed to fill template {template_id:?}"))?;
    let path = output_path(output, &filled.filename);

    let quiet = diagnostic_config.quiet;
    let (code, diagnostics) = report_diagnostics(filled.diagnostics, diagnostic_config, format);
    let written = code.is_success();
    if written {
        std::fs::write(&path, &filled.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    match format {
        Format::Text => {
            if written && !quiet {
                println!(
                    "Wrote {} ({}, {} present of {} working days)",
                    path.display(),
                    filled.orientation.name(),
                    filled.totals.total_present,
                    filled.totals.working_days
                );
            }
        }
        Format::Json => {
            let report = json!({
                "output": written.then(|| path.display().to_string()),
                "filename": filled.filename,
                "orientation": filled.orientation,
                "totals": filled.totals,
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(code)
}

// ============================================================================
// inspect
// ============================================================================

fn cmd_inspect(
    template: &str,
    templates_dir: Option<&Path>,
    period: Option<Period>,
    config: &FillConfig,
    diagnostic_config: DiagnosticConfig,
    format: Format,
) -> Result<ExitCode> {
    let bytes = load_template(template, templates_dir)?;
    let mut inspection = inspect_template(&bytes, period, config)
        .with_context(|| format!("Failed to inspect template {template:?}"))?;

    let diagnostics = std::mem::take(&mut inspection.diagnostics);
    let diagnostic_config = diagnostic_config.with_sheet(inspection.sheet.clone());
    let (code, json_diagnostics) = report_diagnostics(diagnostics, diagnostic_config, format);

    match format {
        Format::Text => print!("{}", render_inspection(&inspection)),
        Format::Json => {
            let mut report = serde_json::to_value(&inspection)?;
            report["diagnostics"] = json_diagnostics;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(code)
}

fn render_inspection(inspection: &Inspection) -> String {
    let layout = &inspection.layout;
    let mut out = format!("sheet: {}\n", inspection.sheet);

    let orientation = match &layout.mode {
        OrientationMode::Horizontal {
            header_row,
            data_row,
            ..
        } => format!("horizontal (header row {header_row}, data row {data_row})"),
        OrientationMode::Vertical {
            header_row,
            data_start_row,
            template_rows,
            ..
        } => format!(
            "vertical (header row {header_row}, data from row {data_start_row}, {template_rows} template rows)"
        ),
    };
    let detected = if layout.detected { "" } else { ", configured default" };
    out.push_str(&format!("orientation: {orientation}{detected}\n"));

    let first = layout.slots.values().next();
    let last = layout.slots.values().next_back();
    if let (Some(first), Some(last)) = (first, last) {
        out.push_str(&format!(
            "days: {} ({}..{}), {} surplus, {} unplaced\n",
            layout.slots.len(),
            first.status,
            last.status,
            layout.surplus.len(),
            layout.unplaced.len()
        ));
    }

    if inspection.legend.is_empty() {
        out.push_str("legend: none\n");
    } else {
        let entries: Vec<String> = inspection
            .legend
            .iter()
            .map(|l| format!("{}={}", l.code, l.cell))
            .collect();
        out.push_str(&format!("legend: {}\n", entries.join(" ")));
    }

    out.push_str("placeholders:\n");
    for placement in &inspection.placements {
        out.push_str(&format!(
            "  {:<14} {} ({:?})\n",
            placement.field.to_string(),
            placement.cell,
            placement.strategy
        ));
    }
    out.push_str(&format!("conditional formats: {}\n", inspection.conditional_formats));
    out
}

// ============================================================================
// template
// ============================================================================

fn cmd_template(id: &str, output: Option<PathBuf>, quiet: bool) -> Result<()> {
    let Some(template) = BuiltinTemplate::from_id(id) else {
        let known: Vec<&str> = BuiltinTemplate::ALL.iter().map(|t| t.id()).collect();
        bail!("Unknown template {id:?} (built-in: {})", known.join(", "));
    };
    let bytes = template.build()?;
    let path = output.unwrap_or_else(|| PathBuf::from(format!("{}.xlsx", template.id())));
    std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    if !quiet {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn cmd_template_list(format: Format) {
    match format {
        Format::Text => {
            for template in BuiltinTemplate::ALL {
                println!("{:<18} {}", template.id(), template.description());
            }
        }
        Format::Json => {
            let list: Vec<_> = BuiltinTemplate::ALL
                .iter()
                .map(|t| json!({ "id": t.id(), "description": t.description() }))
                .collect();
            println!("{}", serde_json::Value::Array(list));
        }
    }
}
