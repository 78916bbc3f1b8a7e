//! Transplant: copy a project's configuration between organizations
//!
//! Reads scope pairs from a CSV file, copies every enabled entity kind from
//! each source project into its target, and freezes sources that moved
//! completely.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use miette::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transplant_migrate::{
    FeatureAreas, MigrationOptions, MigrationPipeline, render_failures, render_status, render_summary,
    run_batch,
};
use transplant_platform::{ClientConfig, PlatformClient};

mod input;

/// Parse boolean from environment variable, accepting common truthy values.
/// Accepts "1", "true", "yes", "on" (case-insensitive) as true.
/// Accepts "0", "false", "no", "off", "" (case-insensitive) as false.
fn parse_bool_env(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(format!(
            "invalid boolean value '{}', expected 1/true/yes/on or 0/false/no/off",
            s
        )),
    }
}

#[derive(Parser)]
#[command(name = "transplant")]
#[command(about = "Copy projects between organizations and freeze the source", long_about = None)]
struct Cli {
    /// CSV file of source org, source project, target org, target project
    #[arg(long, env = "TRANSPLANT_CSV_PATH")]
    csv_path: PathBuf,

    /// API token for the account
    #[arg(long, env = "TRANSPLANT_API_TOKEN", hide_env_values = true)]
    api_token: String,

    /// Account holding both the source and target organizations
    #[arg(long, env = "TRANSPLANT_ACCOUNT_ID")]
    account_id: String,

    /// Base URL of the platform instance
    #[arg(long, env = "TRANSPLANT_BASE_URL")]
    base_url: String,

    /// Copy continuous delivery entities
    #[arg(long, env = "TRANSPLANT_COPY_CD", value_parser = parse_bool_env, default_value = "false", num_args = 0..=1, default_missing_value = "true")]
    copy_cd: bool,

    /// Copy feature flag entities
    #[arg(long, env = "TRANSPLANT_COPY_FF", value_parser = parse_bool_env, default_value = "false", num_args = 0..=1, default_missing_value = "true")]
    copy_ff: bool,

    /// Show per-kind progress on stderr
    #[arg(long, env = "TRANSPLANT_SHOW_PROGRESS", value_parser = parse_bool_env, default_value = "false", num_args = 0..=1, default_missing_value = "true")]
    show_progress: bool,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "error", value_parser = ["info", "warn", "error"])]
    log_level: String,

    /// Log output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    log_format: String,
}

fn init_tracing(level: &str, format: &str) {
    let filter = tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
        format!("transplant={level},transplant_migrate={level},transplant_platform={level}")
    }));
    let registry = tracing_subscriber::registry().with(filter);

    if format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, &cli.log_format);

    let started = Instant::now();
    info!("transplant started");

    let rows = input::read_rows(&cli.csv_path).map_err(|e| miette::miette!("{}", e))?;

    let options = MigrationOptions {
        areas: FeatureAreas {
            continuous_delivery: cli.copy_cd,
            feature_flags: cli.copy_ff,
        },
        show_progress: cli.show_progress,
    };
    if options.areas == FeatureAreas::default() {
        warn!("no feature areas enabled; projects will only be created and frozen");
    }

    let client = PlatformClient::new(ClientConfig::new(
        cli.base_url,
        cli.api_token,
        cli.account_id,
    ))
    .map_err(|e| miette::miette!("failed to create platform client: {}", e))?;

    let pipeline = MigrationPipeline::new(&client, options);
    let report = run_batch(&pipeline, rows).await;

    for summary in &report.summaries {
        println!("{}", render_status(summary));
        let failures = render_failures(summary);
        if !failures.is_empty() {
            println!("{failures}");
        }
    }
    print!("{}", render_summary(&report.summaries));

    let elapsed = started.elapsed();
    let api_calls = client.api_calls();
    let average_call_ms = if api_calls == 0 {
        0
    } else {
        elapsed.as_millis() / u128::from(api_calls)
    };
    info!(
        api_calls,
        duration_ms = elapsed.as_millis() as u64,
        average_call_ms = average_call_ms as u64,
        projects = report.summaries.len(),
        skipped_rows = report.skipped.len(),
        "transplant finished"
    );

    let failed = report.summaries.len() - report.successful();
    if failed > 0 {
        return Err(miette::miette!(
            "{} of {} project(s) were not migrated",
            failed,
            report.summaries.len()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_env() {
        assert_eq!(parse_bool_env("Yes"), Ok(true));
        assert_eq!(parse_bool_env("0"), Ok(false));
        assert_eq!(parse_bool_env(""), Ok(false));
        assert!(parse_bool_env("maybe").is_err());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "transplant",
            "--csv-path",
            "scopes.csv",
            "--api-token",
            "pat.x",
            "--account-id",
            "acct",
            "--base-url",
            "https://app.example.com",
            "--copy-ff",
            "--copy-cd=false",
        ])
        .unwrap();
        assert!(cli.copy_ff);
        assert!(!cli.copy_cd);
        assert!(!cli.show_progress);
        assert_eq!(cli.log_level, "error");
        assert_eq!(cli.log_format, "text");
    }

    #[test]
    fn test_cli_rejects_unknown_log_level() {
        let result = Cli::try_parse_from([
            "transplant",
            "--csv-path",
            "scopes.csv",
            "--api-token",
            "pat.x",
            "--account-id",
            "acct",
            "--base-url",
            "https://app.example.com",
            "--log-level",
            "trace",
        ]);
        assert!(result.is_err());
    }
}
