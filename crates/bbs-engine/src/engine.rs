use std::sync::Arc;

use indicatif::ProgressBar;
use tracing::{debug, error, warn};

use bbs_client::BitbucketApi;
use bbs_core::error::BbsError;
use bbs_core::models::project::Project;
use bbs_core::models::registry::{RepoRegistry, RunTotals};

use crate::enrich::gather_stats;

/// Drives the audit: collects the repository inventory, then enriches it
/// in fixed-size batches of concurrent jobs.
pub struct AuditEngine {
    api: Arc<dyn BitbucketApi>,
    threads: usize,
    progress: ProgressBar,
}

impl AuditEngine {
    pub fn new(api: Arc<dyn BitbucketApi>, threads: usize, progress: ProgressBar) -> Self {
        Self {
            api,
            threads: threads.max(1),
            progress,
        }
    }

    /// Enumerate projects (or look up the single filtered one) and list
    /// every repository they own. Any failure here is fatal: without a
    /// complete inventory there is nothing to report on.
    pub async fn collect(
        &self,
        project_filter: Option<&str>,
    ) -> Result<(Vec<Project>, RepoRegistry), BbsError> {
        self.progress.set_message("looking up projects");
        let projects = match project_filter {
            Some(key) => vec![self.api.project(key).await?],
            None => self.api.list_projects().await.into_result()?,
        };
        if projects.is_empty() {
            return Err(BbsError::NoProjects);
        }
        debug!(count = projects.len(), "collected projects");

        let mut listed = Vec::new();
        for project in &projects {
            self.progress
                .set_message(format!("listing repositories for {}", project.key));
            let repos = self.api.list_repositories(&project.key).await.into_result()?;
            debug!(project = %project.key, count = repos.len(), "collected repositories");
            listed.extend(repos);
        }

        Ok((projects, RepoRegistry::from_listing(listed)))
    }

    /// Enrich every repository in the registry.
    ///
    /// Jobs within a batch run concurrently; the next batch starts only
    /// once the whole batch has drained. Each job hands its snapshot back
    /// through its join handle and this task alone merges results into the
    /// registry and the totals, so the merge needs no lock.
    pub async fn enrich(&self, mut registry: RepoRegistry) -> (RepoRegistry, RunTotals) {
        let listed = registry.snapshot();
        let mut totals = RunTotals::default();
        let mut batch_num = 1usize;

        for batch in listed.chunks(self.threads) {
            self.progress.set_message(format!(
                "running repository analysis batch #{batch_num} ({} jobs)",
                batch.len()
            ));
            debug!(batch = batch_num, jobs = batch.len(), "starting enrichment batch");

            let mut handles = Vec::with_capacity(batch.len());
            for repo in batch {
                let api = Arc::clone(&self.api);
                let repo = repo.clone();
                handles.push(tokio::spawn(async move {
                    let stats = gather_stats(api.as_ref(), &repo).await;
                    (repo, stats)
                }));
            }

            for handle in handles {
                match handle.await {
                    Ok((repo, stats)) => {
                        totals.add(&stats);
                        if !registry.record_stats(repo.id, stats) {
                            warn!(
                                repo = %repo.slug,
                                "error finding batch repository in original list"
                            );
                        }
                    }
                    Err(e) => error!(error = %e, "enrichment job aborted"),
                }
            }

            batch_num += 1;
        }

        (registry, totals)
    }
}
