use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use comfy_table::{Cell, Table};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use bbs_client::BbsClient;
use bbs_core::config::{RunConfig, RunOptions, THREAD_CAUTION_THRESHOLD};
use bbs_engine::engine::AuditEngine;

use crate::{output, Cli};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    debug!("validating flags and environment variables");
    let config = RunConfig::resolve(RunOptions {
        server_url: cli.server_url,
        username: cli.username,
        password: cli.password,
        project: cli.project,
        no_ssl_verify: cli.no_ssl_verify,
        threads: cli.threads,
        output_file: cli.output_file,
        timeout_secs: cli.timeout_secs,
    })?;

    output::flag("Bitbucket Server URL", config.server_url.as_str());
    output::flag("Bitbucket Username", &config.username);
    output::flag("Bitbucket Password", "**********");
    output::flag("SSL Verification Disabled", &config.insecure.to_string());
    output::flag("Threads", &config.threads.to_string());
    output::flag("Output File", &config.output_file.display().to_string());

    if config.caution_threads() {
        output::warning(&format!(
            "Number of concurrent threads is higher than {THREAD_CAUTION_THRESHOLD}. \
             This could result in extreme load on your server."
        ));
        warn!(threads = config.threads, "thread count above caution threshold");
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let client = BbsClient::new(&config)?;
    let engine = AuditEngine::new(Arc::new(client), config.threads, spinner.clone());

    let (projects, registry) = engine
        .collect(config.project.as_deref())
        .await
        .context("error looking up projects and repositories")?;
    let (registry, totals) = engine.enrich(registry).await;

    spinner.finish_and_clear();

    let mut table = Table::new();
    table.set_header(vec!["TOTAL", "VALUE"]);
    table.add_row(vec![Cell::new("Projects"), Cell::new(projects.len())]);
    table.add_row(vec![Cell::new("Repositories"), Cell::new(registry.len())]);
    table.add_row(vec![Cell::new("Pull Requests"), Cell::new(totals.pull_requests)]);
    table.add_row(vec![Cell::new("Comments"), Cell::new(totals.comments)]);
    table.add_row(vec![
        Cell::new("Total Disk Size"),
        Cell::new(bbs_report::display_size(totals.size)),
    ]);
    println!("{table}");

    let file = std::fs::File::create(&config.output_file)
        .with_context(|| format!("error creating {}", config.output_file.display()))?;
    bbs_report::write_csv(file, &registry).context("error writing to output file")?;
    println!("Results written to {}", config.output_file.display());

    Ok(())
}
