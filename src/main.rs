use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use coberturize::config::{self, ConfigLayer, ReportConfig};
use coberturize::coverage::validate_threshold;
use coberturize::{generate, ImportFormat};

#[derive(Parser)]
#[command(name = "coberturize")]
#[command(about = "Convert line coverage data into a Cobertura XML report")]
#[command(version)]
struct Cli {
    /// Coverage data to import [default: all.coverdata]
    #[arg(short, long, value_name = "PATH")]
    cover: Option<PathBuf>,

    /// Where to write the report [default: coverage.xml]
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Source root used to resolve module file names [default: src/]
    #[arg(short, long, value_name = "DIR")]
    src: Option<PathBuf>,

    /// Package name in the report [default: Application]
    #[arg(short, long, value_name = "NAME")]
    appname: Option<String>,

    /// Format of the coverage data [default: lcov]
    #[arg(short, long, value_enum)]
    format: Option<ImportFormat>,

    /// Extension of source files [default: erl]
    #[arg(short, long, value_name = "EXT")]
    extension: Option<String>,

    /// Fail when overall line coverage is below this percentage
    #[arg(long, value_name = "PERCENT")]
    fail_under: Option<f64>,

    /// Optional TOML config file with a [report] table
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print debug diagnostics
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            cover: self.cover.clone(),
            output: self.output.clone(),
            src: self.src.clone(),
            appname: self.appname.clone(),
            format: self.format,
            extension: self.extension.clone(),
            fail_under: self.fail_under,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Returns whether the coverage threshold (if any) was met
fn run(cli: &Cli) -> Result<bool> {
    let file_layer = match &cli.config {
        Some(path) => config::load_config_file(path)
            .with_context(|| format!("Could not load {}", path.display()))?,
        None => ConfigLayer::default(),
    };

    let config = ReportConfig::from_layer(cli.layer().or(file_layer))?;

    let report = generate(&config).with_context(|| {
        format!(
            "Could not convert {} to {}",
            config.cover_data.display(),
            config.output.display()
        )
    })?;

    println!(
        "\n{} Report generated: {}",
        "📊".cyan(),
        config.output.display().to_string().green()
    );
    println!(
        "  {} {} class(es), {}/{} lines covered (line-rate {})",
        "•".green(),
        report.class_count(),
        report.lines_summary.covered,
        report.lines_summary.valid,
        report.line_rate.bold()
    );

    let threshold = validate_threshold(report.lines_summary, config.fail_under);
    threshold.print_summary();

    Ok(threshold.passed)
}
