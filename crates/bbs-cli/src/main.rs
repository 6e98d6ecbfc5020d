mod output;
mod run;

use std::path::{Path, PathBuf};

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "bbs-analyzer",
    version,
    about = "Analyze a Bitbucket Server / Data Center instance for migration statistics"
)]
struct Cli {
    /// Full URL of the Bitbucket Server to analyze, e.g. http://bitbucket.contoso.com:7990
    #[arg(short = 's', long)]
    server_url: Option<String>,

    /// Bitbucket username of a user with site admin privileges. Falls back
    /// to the BBS_USERNAME environment variable.
    #[arg(short = 'u', long)]
    username: Option<String>,

    /// Password for --username. Falls back to the BBS_PASSWORD environment
    /// variable.
    #[arg(short = 'p', long)]
    password: Option<String>,

    /// Analyze a single Bitbucket project instead of all projects
    #[arg(long)]
    project: Option<String>,

    /// Disable TLS certificate verification (self-signed instances)
    #[arg(long)]
    no_ssl_verify: bool,

    /// File to write the results to
    #[arg(short = 'o', long, default_value = "results.csv")]
    output_file: PathBuf,

    /// Number of repositories to analyze concurrently (max 10)
    #[arg(short = 't', long, default_value_t = 3)]
    threads: usize,

    /// Per-request timeout in seconds. Requests wait indefinitely when
    /// unset.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            tracing_subscriber::fmt()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;
    run::run(cli).await
}
