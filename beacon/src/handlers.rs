use anyhow::{Context, Result, bail};
use beacon_core::audit::{AuditOutcome, execute_audit, regenerate_reports};
use beacon_core::config::{AuditConfig, ConfigOverrides, DEFAULT_OUTPUT_DIR, expand_path};
use beacon_core::crawl::{CrawlOptions, execute_crawl, generate_crawl_report};
use beacon_core::report::{ReportFormat, parse_formats, save_report};
use beacon_scanner::{HttpRenderer, StaticAuditor};
use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Install the global subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("{} Skipping invalid URL '{}'", "⚠".yellow(), line);
    None
}

/// Load relative paths from a newline-delimited file. Paths missing a
/// leading `/` get one.
pub fn load_paths_from_file(path: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read paths file {}: {}", path.display(), e))?;

    let paths: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            if line.starts_with('/') {
                line.to_string()
            } else {
                format!("/{}", line)
            }
        })
        .collect();

    if paths.is_empty() {
        return Err(format!("No paths found in {}", path.display()));
    }

    Ok(paths)
}

/// Collect the config overrides given on the command line.
pub fn overrides_from_args(args: &ArgMatches) -> Result<ConfigOverrides, String> {
    let base_url = match args.get_one::<String>("base-url") {
        Some(raw) => Some(
            parse_url_line(raw.trim()).ok_or_else(|| format!("Invalid base URL: {}", raw))?,
        ),
        None => None,
    };

    Ok(ConfigOverrides {
        base_url,
        max_pages: args.get_one::<usize>("max-pages").copied(),
        concurrency: args.get_one::<usize>("concurrency").copied(),
        output_dir: optional_path(args, "output-dir"),
    })
}

fn optional_path(args: &ArgMatches, id: &str) -> Option<PathBuf> {
    args.try_get_one::<PathBuf>(id).ok().flatten().cloned()
}

fn config_path(args: &ArgMatches) -> PathBuf {
    args.get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(beacon_core::config::DEFAULT_CONFIG_FILE))
}

/// Resolve the effective configuration for `scan` and `crawl`.
pub fn resolve_config(args: &ArgMatches) -> Result<AuditConfig> {
    let overrides = overrides_from_args(args).map_err(anyhow::Error::msg)?;
    let mut config = AuditConfig::load_or_overrides(&config_path(args), &overrides)?;

    if let Some(paths_file) = optional_path(args, "paths-file") {
        config.relative_paths =
            load_paths_from_file(&expand_path(&paths_file)).map_err(anyhow::Error::msg)?;
    }

    debug!("Effective config: {:?}", config);
    Ok(config)
}

fn fail(context: &str, e: anyhow::Error) -> ! {
    eprintln!("{} {}: {:#}", "✗".red().bold(), context, e);
    std::process::exit(1);
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

async fn run_scan(args: &ArgMatches, quiet: bool) -> Result<AuditOutcome> {
    let config = resolve_config(args)?;

    if !quiet {
        println!(
            "{} Target: {}",
            "→".blue(),
            config.base_url.bright_white()
        );
        if config.uses_relative_paths() {
            println!(
                "{} Mode: {} configured paths",
                "→".blue(),
                config.relative_paths.len().to_string().cyan()
            );
        } else {
            let limit = config
                .max_pages_to_visit
                .map(|m| m.to_string())
                .unwrap_or_else(|| "unbounded".to_string());
            println!("{} Mode: crawl (max pages: {})", "→".blue(), limit.cyan());
        }
        println!(
            "{} Concurrency: {}",
            "→".blue(),
            config.concurrency.to_string().cyan()
        );
        println!();
    }

    let renderer = Arc::new(HttpRenderer::new().context("Failed to build HTTP client")?);
    let auditor = Arc::new(StaticAuditor::new());

    let outcome = execute_audit(&config, renderer, auditor, !quiet).await?;
    Ok(outcome)
}

pub async fn handle_scan(args: &ArgMatches, quiet: bool) {
    let outcome = match run_scan(args, quiet).await {
        Ok(outcome) => outcome,
        Err(e) => fail("Scan failed", e),
    };

    println!();
    print_divider();
    println!("{}", "  SCAN COMPLETE".green().bold());
    print_divider();
    println!();
    print_scan_summary(&outcome);
}

/// One line per run statistic, then the files written.
pub fn print_scan_summary(outcome: &AuditOutcome) {
    let stats = outcome.stats;
    println!(
        "{} Analyzed: {}",
        "✓".green().bold(),
        stats.analyzed.to_string().cyan()
    );
    println!(
        "{} Skipped (already in results): {}",
        "→".blue(),
        stats.skipped.to_string().cyan()
    );
    if stats.dropped > 0 {
        println!(
            "{} Dropped after retries: {}",
            "⚠".yellow().bold(),
            stats.dropped.to_string().yellow()
        );
    }

    let summary = beacon_core::report::summarize(&outcome.dataset);
    if let Some(average) = summary.average_compliance {
        println!(
            "{} Average compliance: {}",
            "ℹ".blue(),
            format!("{:.2}%", average).bright_white()
        );
    }
    println!(
        "{} Violations: {} critical, {} serious, {} moderate, {} minor",
        "ℹ".blue(),
        summary.impact_totals.critical.to_string().red(),
        summary.impact_totals.serious.to_string().yellow(),
        summary.impact_totals.moderate.to_string().bright_yellow(),
        summary.impact_totals.minor.to_string().cyan()
    );
    println!();
    println!(
        "{} Results: {}",
        "✓".green().bold(),
        outcome.dataset_path.display().to_string().bright_white()
    );
    for report in &outcome.reports {
        println!(
            "{} Report: {}",
            "✓".green().bold(),
            report.display().to_string().bright_white()
        );
    }
    println!();
}

async fn run_crawl(args: &ArgMatches, quiet: bool) -> Result<String> {
    let config = resolve_config(args)?;

    if !quiet {
        println!("\n{} Crawling {}", "→".blue(), config.base_url.bright_white());
        println!(
            "{} Concurrency: {}\n",
            "→".blue(),
            config.concurrency.to_string().cyan()
        );
    }

    let renderer = Arc::new(HttpRenderer::new().context("Failed to build HTTP client")?);
    let options = CrawlOptions {
        base_url: config.base_url.clone(),
        max_pages: config.max_pages_to_visit,
        concurrency: config.concurrency,
        navigation_timeout: config.navigation_timeout(),
        show_progress_bars: !quiet,
    };

    let urls = execute_crawl(options, renderer, None).await?;
    Ok(generate_crawl_report(&urls))
}

pub async fn handle_crawl(args: &ArgMatches, quiet: bool) {
    let report = match run_crawl(args, quiet).await {
        Ok(report) => report,
        Err(e) => fail("Crawl failed", e),
    };

    match optional_path(args, "output") {
        Some(output_path) => {
            let output_path = expand_path(&output_path);
            if let Err(e) = save_report(&report, &output_path) {
                fail("Failed to save page list", e.into());
            }
            println!(
                "{} Page list saved to: {}",
                "✓".green().bold(),
                output_path.display().to_string().bright_white()
            );
        }
        None => print!("{}", report),
    }
}

/// Output directory and formats for `report`: flags first, then the
/// config file when present, then defaults.
pub fn resolve_report_target(args: &ArgMatches) -> Result<(PathBuf, Vec<ReportFormat>)> {
    let config_file = expand_path(&config_path(args));
    let config = if config_file.exists() {
        Some(AuditConfig::load(&config_file)?)
    } else {
        None
    };

    let output_dir = match optional_path(args, "output-dir") {
        Some(dir) => expand_path(&dir),
        None => config
            .as_ref()
            .map(|c| c.output_dir())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
    };

    let names: Vec<String> = match args.get_many::<String>("format") {
        Some(values) => values.cloned().collect(),
        None => config
            .map(|c| c.formats)
            .unwrap_or_else(|| vec!["json".to_string(), "html".to_string()]),
    };
    let formats = parse_formats(&names)?;
    if formats.is_empty() {
        bail!("No report formats selected");
    }

    Ok((output_dir, formats))
}

pub fn handle_report(args: &ArgMatches) {
    let written = resolve_report_target(args)
        .and_then(|(output_dir, formats)| Ok(regenerate_reports(&output_dir, &formats)?));

    match written {
        Ok(paths) => {
            for path in paths {
                println!(
                    "{} Report: {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                );
            }
        }
        Err(e) => fail("Report generation failed", e),
    }
}
