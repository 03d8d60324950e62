use anyhow::Context;
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};
use sitetopic_core::config::{DEFAULT_CONFIG_PATH, expand_path};
use sitetopic_core::{AppConfig, ClassificationService, PageReport, api};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use url::Url;

// Helper functions for URL sources

/// Load URLs from either a file or the URL arguments
pub fn load_urls_from_source(
    urls: &[Url],
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if !urls.is_empty() {
        Ok(urls.iter().map(|url| url.as_str().to_string()).collect())
    } else {
        Err("Either --url or --hosts-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file, skipping blank lines and `#` comments
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
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

    warn!("Skipping invalid URL '{}'", line);
    None
}

// Configuration

/// Config file (or defaults) with the global CLI overrides applied.
pub fn build_config(args: &ArgMatches) -> anyhow::Result<AppConfig> {
    let config_path = args
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = AppConfig::load(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    if let Some(path) = args.get_one::<PathBuf>("keywords") {
        config.keywords_path = expand_path(path);
    }
    if let Some(path) = args.get_one::<PathBuf>("categories") {
        config.categories_path = expand_path(path);
    }
    if let Some(path) = args.get_one::<PathBuf>("cache") {
        config.cache_path = expand_path(path);
    }
    if let Some(endpoint) = args.get_one::<String>("render-endpoint") {
        config.render_endpoint = endpoint.clone();
    }

    Ok(config)
}

pub fn build_service(config: &AppConfig) -> anyhow::Result<ClassificationService> {
    ClassificationService::from_config(config).with_context(|| {
        format!(
            "Failed to load tables {} and {}",
            config.keywords_path.display(),
            config.categories_path.display()
        )
    })
}

// Subcommand handlers. Each returns the JSON response to print.

fn depth(args: &ArgMatches) -> usize {
    args.get_one::<usize>("depth").copied().unwrap_or(1)
}

fn required_url(args: &ArgMatches) -> anyhow::Result<&Url> {
    args.get_one::<Url>("url").context("--url is required")
}

pub async fn handle_pages(service: &ClassificationService, args: &ArgMatches) -> anyhow::Result<Value> {
    let url = required_url(args)?;
    Ok(api::get_pages(service, url.as_str(), depth(args)).await)
}

pub async fn handle_check_url(
    service: &ClassificationService,
    args: &ArgMatches,
) -> anyhow::Result<Value> {
    let url = required_url(args)?;
    Ok(api::check_url(service, url.as_str(), depth(args)).await)
}

pub async fn handle_check_urls(
    service: &ClassificationService,
    args: &ArgMatches,
) -> anyhow::Result<Value> {
    let urls: Vec<Url> = args
        .get_many::<Url>("url")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let urls = load_urls_from_source(&urls, args.get_one::<PathBuf>("hosts-file"))
        .map_err(anyhow::Error::msg)?;

    Ok(api::check_urls(service, &json!({ "urls": urls }), depth(args)).await)
}

pub async fn handle_check_domain(
    service: &ClassificationService,
    args: &ArgMatches,
) -> anyhow::Result<Value> {
    let url = required_url(args)?;
    Ok(api::check_domain(service, url.as_str(), depth(args)).await)
}

/// Score every URL without caching, showing a spinner on stderr.
///
/// Pages that fail are reported and left out of the returned array.
pub async fn handle_analyze(
    service: &ClassificationService,
    args: &ArgMatches,
    quiet: bool,
) -> anyhow::Result<Value> {
    let urls: Vec<Url> = args.get_one::<Url>("url").cloned().into_iter().collect();
    let urls = load_urls_from_source(&urls, args.get_one::<PathBuf>("hosts-file"))
        .map_err(anyhow::Error::msg)?;

    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let total = urls.len();
    let mut reports = Vec::with_capacity(total);
    for (i, url) in urls.iter().enumerate() {
        spinner.set_message(format!("[{}/{}] {}", i + 1, total, url));
        match service.analyze_url(url).await {
            Ok(report) => {
                spinner.println(format_report(&report));
                reports.push(report);
            }
            Err(e) => {
                spinner.println(format!("{} {}: {}", "✗".red().bold(), url, e));
            }
        }
    }

    spinner.finish_and_clear();
    eprintln!(
        "{} Analyzed {}/{} pages",
        "✓".green().bold(),
        reports.len(),
        total
    );

    Ok(serde_json::to_value(reports)?)
}

/// One-line human summary of a page report.
pub fn format_report(report: &PageReport) -> String {
    let topics = report
        .scores
        .iter()
        .map(|e| format!("{} ({})", e.label, e.count))
        .collect::<Vec<_>>()
        .join(", ");
    let keywords = report
        .keywords
        .iter()
        .map(|e| format!("{} ({})", e.label, e.count))
        .collect::<Vec<_>>()
        .join(", ");

    if topics.is_empty() {
        return format!("{} {} {}", "•".yellow(), report.url, "no matches".dimmed());
    }

    format!(
        "{} {}\n    {} {}\n    {} {}",
        "✓".green().bold(),
        report.url.bright_white(),
        "topics:".bright_blue(),
        topics,
        "keywords:".bright_blue(),
        keywords
    )
}

pub fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
