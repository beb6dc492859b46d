//! Hotspots CLI - Command-line interface for Airspot
//!
//! Commands:
//! - detect: Run one hotspot detection and write the ranked table
//! - analyze: Run the overall, peak and off-peak detections in one pass
//! - summary: Print descriptive statistics for the cleaned population
//! - validate: Validate input records
//! - config: Print the default analysis configuration

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use airspot::encoder::ReportEncoder;
use airspot::schema::{ReadingAdapter, ReadingRecord, RegionFilter};
use airspot::summary::PopulationSummary;
use airspot::types::{HotspotReport, Metric, Reading, TimeBucket};
use airspot::{AnalysisConfig, HotspotAnalyzer, HotspotError, AIRSPOT_VERSION};

/// Hotspots - persistent air-quality hotspot identification
#[derive(Parser)]
#[command(name = "hotspots")]
#[command(version = AIRSPOT_VERSION)]
#[command(about = "Find grid cells that stay polluted across many days", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one hotspot detection
    Detect {
        #[command(flatten)]
        input: InputArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "csv")]
        output_format: OutputFormat,

        #[command(flatten)]
        detection: DetectionArgs,
    },

    /// Run the overall, peak and off-peak detections
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Directory receiving one CSV table per detection
        #[arg(long)]
        output_dir: PathBuf,

        /// Also write analysis.json with the summary and all reports
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        detection: DetectionArgs,
    },

    /// Print population statistics after cleaning
    Summary {
        #[command(flatten)]
        input: InputArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate input records
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "csv")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default analysis configuration as JSON
    Config,
}

#[derive(Args)]
struct InputArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Input format
    #[arg(long, default_value = "csv")]
    input_format: InputFormat,

    /// Analysis configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep only records from this city
    #[arg(long)]
    city: Option<String>,

    /// Keep only records from this state
    #[arg(long)]
    state: Option<String>,
}

#[derive(Args)]
struct DetectionArgs {
    /// Metric to rank cells by (pollution_score, PM2_5, PM10, PM2_5_exceedance, PM10_exceedance)
    #[arg(long)]
    metric: Option<String>,

    /// Percentile of the population used as the high-pollution threshold
    #[arg(long)]
    percentile: Option<f64>,

    /// Minimum number of distinct days a cell must be observed on
    #[arg(long)]
    min_days: Option<usize>,

    /// Minimum fraction of observed days above the threshold
    #[arg(long)]
    min_consistency: Option<f64>,

    /// Restrict detection to one time bucket (peak or off_peak)
    #[arg(long)]
    time_bucket: Option<String>,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Flat table, one row per hotspot
    Csv,
    /// JSON report envelope
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), HotspotsCliError> {
    match command {
        Commands::Detect {
            input,
            output,
            output_format,
            detection,
        } => cmd_detect(&input, &output, output_format, &detection),

        Commands::Analyze {
            input,
            output_dir,
            json,
            detection,
        } => cmd_analyze(&input, &output_dir, json, &detection),

        Commands::Summary { input, json } => cmd_summary(&input, json),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Config => {
            println!("{}", AnalysisConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn cmd_detect(
    input: &InputArgs,
    output: &Path,
    output_format: OutputFormat,
    detection: &DetectionArgs,
) -> Result<(), HotspotsCliError> {
    let config = load_config(input.config.as_deref(), detection)?;
    let readings = load_readings(input)?;

    let analyzer = HotspotAnalyzer::new(config)?;
    let population = analyzer.derive(&readings)?;
    let report = analyzer.detect(&population, &analyzer.config().detection)?;
    log_report(&report);

    match output_format {
        OutputFormat::Csv => {
            if is_dash(output) {
                ReportEncoder::write_csv(&report.hotspots, io::stdout().lock())?;
            } else {
                ReportEncoder::write_csv(&report.hotspots, File::create(output)?)?;
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let pretty = matches!(output_format, OutputFormat::JsonPretty);
            let json = ReportEncoder::new().encode_to_json(&[report], None, pretty)?;
            write_output(output, &json)?;
        }
    }

    Ok(())
}

fn cmd_analyze(
    input: &InputArgs,
    output_dir: &Path,
    json: bool,
    detection: &DetectionArgs,
) -> Result<(), HotspotsCliError> {
    if detection.time_bucket.is_some() {
        return Err(HotspotsCliError::Usage(
            "--time-bucket applies to detect; analyze always runs every bucket".to_string(),
        ));
    }

    let config = load_config(input.config.as_deref(), detection)?;
    let readings = load_readings(input)?;
    let analysis = HotspotAnalyzer::new(config)?.analyze(&readings)?;

    fs::create_dir_all(output_dir)?;
    let tables = [
        ("pollution_score_hotspots.csv", &analysis.overall),
        ("peak_hours_hotspots.csv", &analysis.peak),
        ("off_peak_hours_hotspots.csv", &analysis.off_peak),
    ];
    for (file_name, report) in tables {
        log_report(report);
        let path = output_dir.join(file_name);
        ReportEncoder::write_csv(&report.hotspots, File::create(&path)?)?;
        info!("Wrote {}", path.display());
    }

    if json {
        let reports: Vec<HotspotReport> = analysis.reports().into_iter().cloned().collect();
        let document =
            ReportEncoder::new().encode_to_json(&reports, Some(&analysis.summary), true)?;
        let path = output_dir.join("analysis.json");
        fs::write(&path, document)?;
        info!("Wrote {}", path.display());
    }

    Ok(())
}

fn cmd_summary(input: &InputArgs, json: bool) -> Result<(), HotspotsCliError> {
    let config = match input.config.as_deref() {
        Some(path) => AnalysisConfig::from_json(&fs::read_to_string(path)?)?,
        None => AnalysisConfig::default(),
    };
    let readings = load_readings(input)?;
    let analyzer = HotspotAnalyzer::new(config)?;
    let population = analyzer.derive(&readings)?;
    let summary = PopulationSummary::compute(&population, &analyzer.config().limits);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Population Summary");
    println!("==================");
    println!("Readings: {}", summary.readings);
    if let (Some(first), Some(last)) = (&summary.first_reading, &summary.last_reading) {
        println!("Range:    {} to {}", first, last);
    }

    for pollutant in &summary.pollutants {
        println!(
            "\n{} exceedance (guideline {} µg/m³)",
            pollutant.pollutant.as_str(),
            pollutant.guideline
        );
        print_describe(&pollutant.exceedance);
        println!("  above guideline: {:.2}%", pollutant.pct_above_guideline);
    }

    if let Some(score) = &summary.pollution_score {
        println!("\nPollution score");
        print_describe(score);
    }

    println!("\nAQI categories:");
    for share in &summary.categories {
        println!("  {:<32} {:>6.2}%", share.label, share.pct);
    }

    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), HotspotsCliError> {
    let records = parse_records(&read_input(input)?, &input_format)?;
    let results = ReadingAdapter::validate_records(&records);

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - results.len(),
        invalid_records: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Record {}: {}", err.index, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(HotspotsCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

// Helper functions

fn load_config(
    path: Option<&Path>,
    detection: &DetectionArgs,
) -> Result<AnalysisConfig, HotspotsCliError> {
    let mut config = match path {
        Some(path) => AnalysisConfig::from_json(&fs::read_to_string(path)?)?,
        None => AnalysisConfig::default(),
    };

    let params = &mut config.detection;
    if let Some(metric) = &detection.metric {
        params.metric = metric.parse::<Metric>()?;
    }
    if let Some(percentile) = detection.percentile {
        params.percentile = percentile;
    }
    if let Some(min_days) = detection.min_days {
        params.min_days_total = min_days;
    }
    if let Some(min_consistency) = detection.min_consistency {
        params.min_consistency = min_consistency;
    }
    if let Some(bucket) = &detection.time_bucket {
        params.time_filter = Some(bucket.parse::<TimeBucket>()?);
    }

    config.validate()?;
    Ok(config)
}

fn load_readings(input: &InputArgs) -> Result<Vec<Reading>, HotspotsCliError> {
    let records = parse_records(&read_input(&input.input)?, &input.input_format)?;
    if records.is_empty() {
        return Err(HotspotsCliError::NoRecords);
    }

    let region = RegionFilter {
        city: input.city.clone(),
        state: input.state.clone(),
    };
    let region = (!region.is_empty()).then_some(region);

    let cleaned = ReadingAdapter::clean(&records, region.as_ref());
    info!(
        "Data shape after cleaning: {} readings ({} dropped, {} outside region)",
        cleaned.readings.len(),
        cleaned.dropped.len(),
        cleaned.outside_region
    );

    Ok(cleaned.readings)
}

fn read_input(input: &Path) -> Result<String, HotspotsCliError> {
    if is_dash(input) {
        if atty::is(atty::Stream::Stdin) {
            return Err(HotspotsCliError::StdinIsTerminal);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_records(
    input_data: &str,
    input_format: &InputFormat,
) -> Result<Vec<ReadingRecord>, HotspotsCliError> {
    let records = match input_format {
        InputFormat::Csv => ReadingAdapter::parse_csv_str(input_data)?,
        InputFormat::Ndjson => ReadingAdapter::parse_ndjson(input_data)?,
    };
    Ok(records)
}

fn write_output(output: &Path, data: &str) -> Result<(), HotspotsCliError> {
    if is_dash(output) {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", data)?;
        stdout.flush()?;
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

/// `-` stands for stdin or stdout
fn is_dash(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn log_report(report: &HotspotReport) {
    let bucket = report
        .time_filter
        .map(|b| b.as_str())
        .unwrap_or("all hours");
    match report.threshold {
        Some(threshold) => info!(
            "[{}] threshold for {} (percentile {}): {:.2}, {} hotspots in {} cells",
            bucket,
            report.metric,
            report.percentile,
            threshold,
            report.hotspots.len(),
            report.cells_examined
        ),
        None => info!("[{}] no data available", bucket),
    }
}

fn print_describe(d: &airspot::stats::Describe) {
    println!("  count {}  mean {:.3}  std {:.3}", d.count, d.mean, d.std);
    println!(
        "  min {:.3}  25% {:.3}  50% {:.3}  75% {:.3}  max {:.3}",
        d.min, d.p25, d.p50, d.p75, d.max
    );
}

// Error types

#[derive(Debug)]
enum HotspotsCliError {
    Io(io::Error),
    Hotspot(HotspotError),
    Json(serde_json::Error),
    NoRecords,
    StdinIsTerminal,
    ValidationFailed(usize),
    Usage(String),
}

impl From<io::Error> for HotspotsCliError {
    fn from(e: io::Error) -> Self {
        HotspotsCliError::Io(e)
    }
}

impl From<HotspotError> for HotspotsCliError {
    fn from(e: HotspotError) -> Self {
        HotspotsCliError::Hotspot(e)
    }
}

impl From<serde_json::Error> for HotspotsCliError {
    fn from(e: serde_json::Error) -> Self {
        HotspotsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<HotspotsCliError> for CliError {
    fn from(e: HotspotsCliError) -> Self {
        match e {
            HotspotsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            HotspotsCliError::Hotspot(e) => {
                let (code, hint) = match &e {
                    HotspotError::InvalidConfig(_) => (
                        "CONFIG_ERROR",
                        "Run 'hotspots config' to see a valid configuration",
                    ),
                    HotspotError::UnknownMetric(_) => (
                        "UNKNOWN_METRIC",
                        "Use pollution_score, PM2_5, PM10, PM2_5_exceedance or PM10_exceedance",
                    ),
                    HotspotError::CsvError(_) | HotspotError::ParseError(_) => (
                        "PARSE_ERROR",
                        "Expected local_time,latitude,longitude,PM2_5,PM10 columns",
                    ),
                    HotspotError::MissingField(_) => (
                        "MISSING_COLUMN",
                        "Expected local_time,latitude,longitude,PM2_5,PM10 columns",
                    ),
                    HotspotError::InvalidReading(_) => {
                        ("VALIDATION_ERROR", "Run 'hotspots validate' for details")
                    }
                    _ => ("ANALYSIS_ERROR", "Check input data and configuration"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            HotspotsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            HotspotsCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            HotspotsCliError::StdinIsTerminal => CliError {
                code: "STDIN_IS_TERMINAL".to_string(),
                message: "Refusing to read records from an interactive terminal".to_string(),
                hint: Some("Pipe a file into stdin or pass --input <path>".to_string()),
            },
            HotspotsCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Records with missing values are dropped during analysis".to_string()),
            },
            HotspotsCliError::Usage(msg) => CliError {
                code: "USAGE_ERROR".to_string(),
                message: msg,
                hint: None,
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    error: String,
}
