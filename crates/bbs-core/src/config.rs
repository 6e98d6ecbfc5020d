use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::BbsError;

/// Hard upper bound on concurrent enrichment jobs.
pub const MAX_THREADS: usize = 10;

/// Above this width the operator is warned about server load.
pub const THREAD_CAUTION_THRESHOLD: usize = 3;

/// Page size requested from every paged listing endpoint.
pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// Raw run parameters as supplied on the command line, before validation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub server_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub project: Option<String>,
    pub no_ssl_verify: bool,
    pub threads: usize,
    pub output_file: PathBuf,
    pub timeout_secs: Option<u64>,
}

/// Validated run parameters, fixed for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub server_url: Url,
    pub username: String,
    pub password: String,
    /// Restrict the audit to a single project key.
    pub project: Option<String>,
    /// Skip TLS certificate verification (self-signed instances).
    pub insecure: bool,
    pub threads: usize,
    pub output_file: PathBuf,
    pub page_limit: u64,
    /// Per-request timeout. No timeout is applied when unset.
    pub timeout: Option<Duration>,
}

impl RunConfig {
    /// Validate raw options into a run configuration. Credentials missing
    /// from the flags fall back to the `BBS_USERNAME` / `BBS_PASSWORD`
    /// environment variables.
    pub fn resolve(opts: RunOptions) -> Result<Self, BbsError> {
        let raw_url = opts
            .server_url
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BbsError::Config {
                message: "a Bitbucket server URL must be provided".into(),
            })?;
        let server_url = Url::parse(&raw_url).map_err(|e| BbsError::Config {
            message: format!("invalid server URL '{raw_url}': {e}"),
        })?;
        if server_url.scheme() != "http" && server_url.scheme() != "https" {
            return Err(BbsError::Config {
                message: "the Bitbucket server URL must use an http(s) scheme".into(),
            });
        }

        if opts.threads == 0 {
            return Err(BbsError::Config {
                message: "at least one concurrent thread is required".into(),
            });
        }
        if opts.threads > MAX_THREADS {
            return Err(BbsError::Config {
                message: format!(
                    "number of concurrent threads cannot be higher than {MAX_THREADS}"
                ),
            });
        }

        let username = resolve_credential(opts.username, "BBS_USERNAME", "username")?;
        let password = resolve_credential(opts.password, "BBS_PASSWORD", "password")?;

        Ok(Self {
            server_url,
            username,
            password,
            project: opts.project,
            insecure: opts.no_ssl_verify,
            threads: opts.threads,
            output_file: opts.output_file,
            page_limit: DEFAULT_PAGE_LIMIT,
            timeout: opts.timeout_secs.map(Duration::from_secs),
        })
    }

    /// Whether the configured width warrants a load warning.
    pub fn caution_threads(&self) -> bool {
        self.threads > THREAD_CAUTION_THRESHOLD
    }
}

fn resolve_credential(
    flag: Option<String>,
    env_var: &str,
    what: &str,
) -> Result<String, BbsError> {
    if let Some(value) = flag.filter(|s| !s.is_empty()) {
        return Ok(value);
    }
    match std::env::var(env_var) {
        Ok(value) if !value.is_empty() => {
            tracing::debug!("Bitbucket {what} set from environment variable {env_var}");
            Ok(value)
        }
        _ => Err(BbsError::Config {
            message: format!(
                "a Bitbucket {what} was not provided via flags or the {env_var} environment variable"
            ),
        }),
    }
}
