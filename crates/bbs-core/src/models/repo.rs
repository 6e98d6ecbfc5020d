use serde::Deserialize;

use super::project::Project;
use super::pull_request::PullRequest;

/// Disk usage reported by the raw `sizes` endpoint, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RepoSize {
    #[serde(default)]
    pub repository: u64,
    #[serde(default)]
    pub attachments: u64,
}

/// Statistics attached to a repository by an enrichment job.
#[derive(Debug, Clone, Default)]
pub struct RepoStats {
    pub size: RepoSize,
    pub pull_requests: Vec<PullRequest>,
    /// Sum of comment counts over all pull requests, computed once.
    pub comment_count: u64,
}

/// A repository as returned by the listing API, carrying a copy of its
/// owning project.
///
/// `stats` stays `None` until an enrichment job completes for it; the
/// registry writes it in a single assignment so no half-populated entry is
/// ever observable.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub slug: String,
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub forkable: bool,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub project: Project,
    #[serde(skip)]
    pub stats: Option<RepoStats>,
}
