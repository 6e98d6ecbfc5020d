use tracing::warn;

use bbs_client::BitbucketApi;
use bbs_core::models::repo::{RepoSize, RepoStats, Repository};

/// Fetch size and pull-request statistics for a single repository.
///
/// Failures here are non-fatal: the affected statistic stays at its zero
/// default and the job still completes, so one bad repository never stalls
/// its batch.
pub(crate) async fn gather_stats(api: &dyn BitbucketApi, repo: &Repository) -> RepoStats {
    let size = match api.repository_size(&repo.project.key, &repo.slug).await {
        Ok(size) => size,
        Err(e) => {
            warn!(repo = %repo.slug, error = %e, "error looking up repository size");
            RepoSize::default()
        }
    };

    let paged = api.list_pull_requests(&repo.project.key, &repo.slug).await;
    if let Some(e) = &paged.error {
        warn!(
            repo = %repo.slug,
            error = %e,
            "error looking up pull requests, keeping pages fetched so far"
        );
    }
    let pull_requests = paged.values;
    let comment_count = pull_requests
        .iter()
        .map(|pr| pr.properties.comment_count)
        .sum();

    RepoStats {
        size,
        pull_requests,
        comment_count,
    }
}
