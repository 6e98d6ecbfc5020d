use serde::Deserialize;

/// A pull request scoped to one repository. Fetched once, never merged
/// further; only the comment count matters for the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    /// Absent on pull requests that never received a comment.
    #[serde(default)]
    pub properties: PullRequestProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PullRequestProperties {
    #[serde(default, rename = "commentCount")]
    pub comment_count: u64,
}
