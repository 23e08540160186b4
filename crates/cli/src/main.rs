//! world-kpi CLI - Battery KPI data for the world dashboard

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

mod error;
mod sample;
mod source;
mod table;
mod validation;

use sample::Scenario;
use source::{DataSource, FetchPolicy};
use table::SortColumn;
use world_kpi_core::{
    aggregate_by_dimension, min_max, outliers, value_stats, CountryAggregate, CountrySummary,
    Dimension, FilterSet, GroupStats, KpiDataset, KpiRecord, MinMax, OutlierBounds, ValueField,
    ValueStats,
};

/// world-kpi: Explore battery KPI data by country
#[derive(Parser, Debug)]
#[command(name = "world-kpi")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the `;`-delimited KPI file
    #[arg(
        long,
        global = true,
        env = "WORLD_KPI_DATA_FILE",
        default_value = "data/world_kpi_anonym.txt"
    )]
    data_file: PathBuf,

    /// Load the dataset over HTTP instead of from --data-file
    #[arg(long, global = true, env = "WORLD_KPI_DATA_URL")]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the distinct values of every filter dimension
    Facets(FacetsArgs),
    /// Show the records matching a set of filters
    Filter(FilterCommandArgs),
    /// Sum one variable per country, with the color-scale bounds
    Aggregate(AggregateArgs),
    /// Show the records and summary of one country
    Country(CountryArgs),
    /// Value or vehicle-count statistics, optionally grouped, with outliers
    Stats(StatsArgs),
    /// Report malformed lines of the dataset
    Inspect,
    /// Write a dashboard snapshot as JSON
    Export(ExportArgs),
    /// Write a synthetic dataset
    Sample(SampleArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    #[arg(long)]
    variable: Option<String>,

    #[arg(long)]
    continent: Option<String>,

    #[arg(long)]
    climate: Option<String>,

    #[arg(long)]
    batt_alias: Option<String>,

    #[arg(long)]
    model_series: Option<String>,

    /// Extra `dimension=value` constraints (repeatable)
    #[arg(long = "where", value_name = "DIMENSION=VALUE")]
    assignments: Vec<String>,
}

impl FilterArgs {
    fn to_filter_set(&self) -> Result<FilterSet> {
        let filters = FilterSet::from_assignments(self.assignments.iter().map(String::as_str))
            .with_context(|| "Invalid --where filter")?;

        Ok(filters
            .with_opt(Dimension::Variable, self.variable.as_deref())
            .with_opt(Dimension::Continent, self.continent.as_deref())
            .with_opt(Dimension::Climate, self.climate.as_deref())
            .with_opt(Dimension::BattAlias, self.batt_alias.as_deref())
            .with_opt(Dimension::ModelSeries, self.model_series.as_deref()))
    }
}

#[derive(Parser, Debug)]
struct FacetsArgs {
    /// Sort values instead of keeping first-appearance order
    #[arg(long)]
    sorted: bool,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct FilterCommandArgs {
    #[command(flatten)]
    filters: FilterArgs,

    /// Case-insensitive text search across all fields
    #[arg(short, long)]
    search: Option<String>,

    #[arg(long, value_enum)]
    sort_by: Option<SortColumn>,

    #[arg(long)]
    descending: bool,

    #[arg(short, long)]
    limit: Option<usize>,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct AggregateArgs {
    #[command(flatten)]
    filters: FilterArgs,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct CountryArgs {
    /// ISO 3166-1 alpha-3 code, e.g. DEU
    iso: String,

    #[command(flatten)]
    filters: FilterArgs,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct StatsArgs {
    /// Group by a dimension (variable, battAlias, continent, climate, modelSeries)
    #[arg(long)]
    by: Option<Dimension>,

    /// Numeric column: value or count
    #[arg(long, default_value = "value")]
    field: ValueField,

    /// Also list the records outside the outlier fences
    #[arg(long)]
    outliers: bool,

    #[command(flatten)]
    filters: FilterArgs,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[arg(short, long, default_value = "dashboard-snapshot.json")]
    output: PathBuf,

    #[command(flatten)]
    filters: FilterArgs,
}

#[derive(Parser, Debug)]
struct SampleArgs {
    #[arg(long, value_enum, default_value = "full")]
    scenario: Scenario,

    #[arg(short, long, default_value = "world_kpi_sample.txt")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Sample(args) = &cli.command {
        return sample_command(args);
    }

    let dataset = load_dataset(&cli)?;

    match cli.command {
        Commands::Facets(args) => facets_command(&dataset, args),
        Commands::Filter(args) => filter_command(&dataset, args),
        Commands::Aggregate(args) => aggregate_command(&dataset, args),
        Commands::Country(args) => country_command(&dataset, args),
        Commands::Stats(args) => stats_command(&dataset, args),
        Commands::Inspect => inspect_command(&dataset),
        Commands::Export(args) => export_command(&dataset, args),
        Commands::Sample(_) => Ok(()),
    }
}

fn load_dataset(cli: &Cli) -> Result<KpiDataset> {
    let source = match cli.url.as_deref() {
        Some(url) => DataSource::Url(validation::validate_data_url(url)?),
        None => {
            validation::validate_file_exists(&cli.data_file, "Data file")?;
            DataSource::File(cli.data_file.clone())
        }
    };

    let text = source::load_text(&source, &FetchPolicy::default())
        .with_context(|| format!("Failed to load dataset from {}", source))?;
    let dataset = KpiDataset::from_text(&text);

    let report = dataset.parse_report();
    info!("Loaded {} records from {}", dataset.len(), source);
    if !report.skipped.is_empty() {
        debug!("Skipped {} malformed lines", report.skipped.len());
    }
    if dataset.is_empty() {
        warn!("Dataset contains no records");
    }

    Ok(dataset)
}

fn facets_command(dataset: &KpiDataset, args: FacetsArgs) -> Result<()> {
    let facets = if args.sorted {
        dataset.facets().sorted()
    } else {
        dataset.facets()
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&facets)?),
        OutputFormat::Text => println!("{}", table::render_facets(&facets)),
    }

    Ok(())
}

fn filter_command(dataset: &KpiDataset, args: FilterCommandArgs) -> Result<()> {
    validation::validate_limit(args.limit)?;
    let filters = args.filters.to_filter_set()?;

    let mut records = match args.search.as_deref() {
        Some(query) => dataset.search(&filters, query),
        None => dataset.filter(&filters),
    };
    debug!("{} records match", records.len());

    if let Some(column) = args.sort_by {
        table::sort_records(&mut records, column, args.descending);
    }
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No data available for the current filters.");
            } else {
                println!("{}", table::render_records(&records));
                println!("\n{} record(s)", records.len());
            }
        }
    }

    Ok(())
}

fn aggregate_command(dataset: &KpiDataset, args: AggregateArgs) -> Result<()> {
    let filters = args
        .filters
        .to_filter_set()?
        .with_default_variable(&dataset.facets());

    if dataset.is_empty() {
        println!("No data available for the current filters.");
        return Ok(());
    }

    let aggregate = dataset
        .aggregate(&filters)
        .with_context(|| "Failed to aggregate by country")?;
    let scale = min_max(&aggregate);
    if scale.is_poisoned() {
        warn!("Some country totals are NaN: the dataset contains non-numeric values");
    }

    match args.format {
        OutputFormat::Json => {
            let output = AggregateOutput {
                filters: &filters,
                aggregate: &aggregate,
                scale,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            if let Some(variable) = filters.get(Dimension::Variable) {
                println!("## {}\n", variable);
            }
            println!("{}", table::render_aggregate(&aggregate, &scale));
        }
    }

    Ok(())
}

fn country_command(dataset: &KpiDataset, args: CountryArgs) -> Result<()> {
    let iso = validation::validate_iso_code(&args.iso)?;
    let filters = args.filters.to_filter_set()?;
    let filters = if filters.is_empty() {
        None
    } else {
        Some(&filters)
    };

    let records = dataset.country(&iso, filters);
    let summary = dataset.country_summary(&iso, filters);

    match args.format {
        OutputFormat::Json => {
            let output = CountryOutput {
                summary: summary.as_ref(),
                records: &records,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => match summary {
            None => println!("No data available for {}.", iso),
            Some(summary) => {
                println!("## {} ({})\n", summary.country, summary.iso_a3);
                println!("Continent:     {}", summary.continent);
                println!("Climate:       {}", summary.climate);
                println!("Records:       {}", summary.records);
                println!(
                    "Vehicles:      {}",
                    world_kpi_core::format_number(summary.vehicle_count)
                );
                println!("Batteries:     {}", summary.battery_types.join(", "));
                println!("Variables:     {}", summary.variables.join(", "));
                println!();
                println!("{}", table::render_records(&records));
            }
        },
    }

    Ok(())
}

fn stats_command(dataset: &KpiDataset, args: StatsArgs) -> Result<()> {
    let filters = args.filters.to_filter_set()?;
    let records = dataset.filter(&filters);
    debug!("Computing {} statistics over {} records", args.field, records.len());

    let output = StatsOutput {
        field: args.field,
        overall: value_stats(&records, args.field),
        groups: args
            .by
            .map(|dimension| aggregate_by_dimension(&records, dimension, args.field)),
        bounds: OutlierBounds::from_records(&records, args.field),
        outliers: if args.outliers {
            outliers(&records, args.field)
        } else {
            Vec::new()
        },
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No data available for the current filters.");
                return Ok(());
            }

            println!("{}", table::render_value_stats(output.field, &output.overall));
            if let (Some(dimension), Some(groups)) = (args.by, &output.groups) {
                println!("\n{}", table::render_group_stats(dimension, groups));
            }
            if args.outliers {
                if let Some(bounds) = &output.bounds {
                    println!(
                        "\nOutliers outside [{}, {}]: {}",
                        world_kpi_core::format_number(bounds.lower),
                        world_kpi_core::format_number(bounds.upper),
                        output.outliers.len()
                    );
                }
                if !output.outliers.is_empty() {
                    println!("{}", table::render_records(&output.outliers));
                }
            }
        }
    }

    Ok(())
}

fn inspect_command(dataset: &KpiDataset) -> Result<()> {
    let report = dataset.parse_report();

    println!("Header columns: {}", report.header_columns);
    println!("Data lines:     {}", report.data_lines);
    println!("Blank lines:    {}", report.blank_lines);
    println!("Records:        {}", report.parsed());
    println!("Skipped:        {}", report.skipped.len());

    for skipped in &report.skipped {
        println!(
            "  - line {}: {} fields (expected {})",
            skipped.line, skipped.fields, report.header_columns
        );
    }

    let non_numeric = dataset
        .records()
        .iter()
        .filter(|r| r.value.is_nan())
        .count();
    if non_numeric > 0 {
        println!("Non-numeric values: {}", non_numeric);
    }

    Ok(())
}

fn export_command(dataset: &KpiDataset, args: ExportArgs) -> Result<()> {
    let filters = args.filters.to_filter_set()?;

    let snapshot = dataset
        .snapshot(&filters)
        .with_context(|| "Failed to build dashboard snapshot")?;
    snapshot
        .save_to_file(&args.output)
        .with_context(|| "Failed to save dashboard snapshot")?;

    info!(
        "Wrote snapshot for {} countries to {:?}",
        snapshot.aggregate.len(),
        args.output
    );

    Ok(())
}

fn sample_command(args: &SampleArgs) -> Result<()> {
    let text = sample::generate(args.scenario);

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| error::Error::FileWrite {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    std::fs::write(&args.output, text).map_err(|e| error::Error::FileWrite {
        path: args.output.display().to_string(),
        source: e,
    })?;

    info!("Wrote {:?} scenario to {:?}", args.scenario, args.output);

    Ok(())
}

#[derive(Serialize)]
struct AggregateOutput<'a> {
    filters: &'a FilterSet,
    aggregate: &'a CountryAggregate,
    scale: MinMax,
}

#[derive(Serialize)]
struct CountryOutput<'a> {
    summary: Option<&'a CountrySummary>,
    records: &'a [KpiRecord],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsOutput {
    field: ValueField,
    overall: ValueStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<Vec<GroupStats>>,
    bounds: Option<OutlierBounds>,
    outliers: Vec<KpiRecord>,
}
