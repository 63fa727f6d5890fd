//! Clinistat CLI - Run pivot analyses over clinical records
//!
//! Usage:
//!   clinistat analyze --config <config.json> --data <records.json> --org-units <org_units.json>
//!   clinistat indicators [--settings <clinistat.toml>]
//!   clinistat dimensions [--settings <clinistat.toml>]
//!
//! Examples:
//!   clinistat analyze --config demos/hiv_by_sex.json --data demos/records.json \
//!       --org-units demos/org_units.json --format table
//!   clinistat indicators --settings demos/clinistat.toml

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use clinistat::config::Settings;
use clinistat::dimension::DimensionRegistry;
use clinistat::fetch::{InMemorySource, SourceCatalog};
use clinistat::indicator::IndicatorRegistry;
use clinistat::model::{AnalysisConfig, AnalysisResult, Record, SourceId, INDICATOR_DIMENSION};
use clinistat::org_unit::OrgUnitCatalog;
use clinistat::pivot::group_headers;
use clinistat::AnalyticsEngine;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clinistat")]
#[command(about = "Clinistat - Pivot analytics over clinical service records")]
#[command(version)]
struct Cli {
    /// Path to a clinistat.toml (default lookup when omitted)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an analysis
    Analyze {
        /// Analysis configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Records grouped by source id (JSON object of arrays)
        #[arg(short, long)]
        data: PathBuf,

        /// Org-unit catalog (JSON)
        #[arg(short, long)]
        org_units: PathBuf,

        /// Reference date for relative periods (defaults to today)
        #[arg(short, long)]
        today: Option<NaiveDate>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// List available indicators
    Indicators,

    /// List available dimensions
    Dimensions,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Full result as JSON
    Json,
    /// Text table with grouped headers
    Table,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Settings error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&settings);

    match cli.command {
        Commands::Analyze {
            config,
            data,
            org_units,
            today,
            format,
        } => cmd_analyze(settings, &config, &data, &org_units, today, format),
        Commands::Indicators => cmd_indicators(&settings),
        Commands::Dimensions => cmd_dimensions(&settings),
    }
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Error reading file '{}': {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Error parsing file '{}': {}", path.display(), e))
}

fn cmd_analyze(
    settings: Settings,
    config: &Path,
    data: &Path,
    org_units: &Path,
    today: Option<NaiveDate>,
    format: OutputFormat,
) -> ExitCode {
    let inputs = read_json::<AnalysisConfig>(config).and_then(|config| {
        let records = read_json::<HashMap<SourceId, Vec<Record>>>(data)?;
        let org_units = read_json::<OrgUnitCatalog>(org_units)?;
        Ok((config, records, org_units))
    });
    let (config, records, org_units) = match inputs {
        Ok(inputs) => inputs,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let catalog = Arc::new(SourceCatalog::new(&settings.sources));
    let source = Arc::new(InMemorySource::new(records, catalog));
    let engine = AnalyticsEngine::new(settings, org_units, source, None);

    let result = runtime.block_on(async {
        match today {
            Some(today) => engine.run_at(&config, today).await,
            None => engine.run(&config).await,
        }
    });

    match result {
        Ok(result) => {
            match format {
                OutputFormat::Json => match serde_json::to_string_pretty(&result) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing result: {}", e);
                        return ExitCode::FAILURE;
                    }
                },
                OutputFormat::Table => print_table(&result, &config),
            }
            ExitCode::SUCCESS
        }
        Err(e) if e.is_configuration_error() => {
            eprintln!("Invalid analysis configuration: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Analysis failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

const CELL_WIDTH: usize = 14;

fn print_table(result: &AnalysisResult, config: &AnalysisConfig) {
    // The engine may have appended the indicator column
    let mut column_dims: Vec<String> = config.columns.clone();
    if let Some(first) = result.columns.first() {
        if first.dimensions.contains_key(INDICATOR_DIMENSION)
            && !column_dims.iter().any(|d| d == INDICATOR_DIMENSION)
        {
            column_dims.push(INDICATOR_DIMENSION.to_string());
        }
    }
    // Columns are ordered indicator first, so it groups the outer header
    if let Some(pos) = column_dims.iter().position(|d| d == INDICATOR_DIMENSION) {
        let indicator = column_dims.remove(pos);
        column_dims.insert(0, indicator);
    }

    let row_width = result
        .rows
        .iter()
        .map(|r| r.label.chars().count())
        .max()
        .unwrap_or(0)
        .max(5);

    println!(
        "Period: {} ({})  Facilities: {}",
        result.metadata.period,
        result.metadata.granularity,
        result.metadata.org_units.len()
    );
    println!();

    for level in group_headers(&result.columns, &column_dims) {
        let mut line = format!("{:<width$}", "", width = row_width);
        for cell in level {
            let width = cell.span * (CELL_WIDTH + 1) - 1;
            line.push_str(&format!(" {:^width$}", truncate(&cell.label, width), width = width));
        }
        println!("{}", line);
    }

    for row in &result.rows {
        let mut line = format!("{:<width$}", row.label, width = row_width);
        for column in &result.columns {
            let text = row
                .cells
                .get(&column.key)
                .map(|c| c.formatted_value.as_str())
                .unwrap_or("");
            line.push_str(&format!(" {:>width$}", text, width = CELL_WIDTH));
        }
        line.push_str(&format!(" {:>width$}", row.row_total.formatted_value, width = CELL_WIDTH));
        println!("{}", line);
    }

    if result.metadata.visualization.show_totals {
        let mut line = format!("{:<width$}", "Total", width = row_width);
        for total in result.column_totals.values() {
            line.push_str(&format!(" {:>width$}", total.formatted_value, width = CELL_WIDTH));
        }
        line.push_str(&format!(
            " {:>width$}",
            result.grand_total.formatted_value,
            width = CELL_WIDTH
        ));
        println!("{}", line);
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        text.chars().take(width.saturating_sub(1)).chain(Some('~')).collect()
    }
}

fn cmd_indicators(settings: &Settings) -> ExitCode {
    let registry = IndicatorRegistry::from_settings(settings);

    println!("{} indicators", registry.len());
    println!();
    for indicator in registry.iter() {
        println!(
            "  {:<28} {:<14} {:?} [{}]",
            indicator.id,
            indicator.short_name,
            indicator.aggregation,
            indicator.sources.join(", ")
        );
    }
    ExitCode::SUCCESS
}

fn cmd_dimensions(settings: &Settings) -> ExitCode {
    let catalog = SourceCatalog::new(&settings.sources);
    let registry = DimensionRegistry::from_settings(settings, &catalog, None);

    println!("{} dimensions", registry.len());
    println!();
    for dimension in registry.iter() {
        println!("  {:<20} {:<24} {:?}", dimension.id, dimension.name, dimension.kind);
    }
    ExitCode::SUCCESS
}
