mod cli_args;
mod query;
mod report;

use std::{env, fs};

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use shiplog_config::ShiplogConfig;
use shiplog_domain::EnrichedIssue;
use shiplog_jira::{resolve::resolve_epic, JiraClient};
use tracing::{debug, info};

use crate::cli_args::{CliAction, RunOptions};
use crate::report::ReportContext;

const REPORT_FILE: &str = "report.md";
const SEARCH_PAGE_SIZE: usize = 100;

fn main() -> Result<()> {
    let options = match cli_args::parse_cli_action()? {
        CliAction::Help => {
            cli_args::print_help();
            return Ok(());
        }
        CliAction::Run(options) => options,
    };

    init_logging(options.verbose);
    run(options)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("failed to set tracing subscriber");
}

fn run(options: RunOptions) -> Result<()> {
    let config = match &options.config_path {
        Some(path) => ShiplogConfig::load_from_path(path)?,
        None => ShiplogConfig::load_default()?,
    };
    let server = config
        .jira_server
        .clone()
        .ok_or_else(|| anyhow!("jira_server not configured"))?;

    let today = Local::now().date_naive();
    let window = query::window_days(options.start_date, today, config.report.window_days)?;
    let jql = query::build_jql(&config.report, window)?;
    debug!("search filter: {jql}");

    let client = JiraClient::from_config(&config)?;
    let issues = client.search_issues_all(&jql, SEARCH_PAGE_SIZE)?;
    info!(
        "found {} issues in the {} status of the {} project from last {} days",
        issues.len(),
        config.report.status.as_deref().unwrap_or_default(),
        config.report.project.as_deref().unwrap_or_default(),
        window
    );

    info!("resolving epics...");
    let bar = resolution_progress_bar(issues.len() as u64);
    let mut rows = Vec::with_capacity(issues.len());
    for issue in issues {
        let epic = resolve_epic(&client, &issue)?;
        rows.push(EnrichedIssue { issue, epic });
        bar.inc(1);
    }
    bar.finish_and_clear();

    info!("generating report...");
    let ctx = ReportContext {
        server: &server,
        date: today,
        feature_type: &config.report.feature_type,
        bug_type: &config.report.bug_type,
        applications: config.report.applications.as_deref(),
    };
    let content = report::render(&rows, &ctx);
    fs::write(REPORT_FILE, content).with_context(|| format!("failed to write {REPORT_FILE}"))?;

    let cwd = env::current_dir().with_context(|| "failed to resolve working directory")?;
    info!("report written to {}", cwd.join(REPORT_FILE).display());
    Ok(())
}

fn resolution_progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("progress bar template")
            .progress_chars("#>-"),
    );
    bar
}
