use std::collections::HashMap;

use super::repo::{RepoStats, Repository};

/// The authoritative, order-preserving collection of repositories for a
/// run.
///
/// Populated once from the listing phase and never grows or shrinks
/// afterwards; enrichment only overwrites the `stats` field of existing
/// entries, located by repository id.
#[derive(Debug, Default)]
pub struct RepoRegistry {
    repos: Vec<Repository>,
    by_id: HashMap<u64, usize>,
}

impl RepoRegistry {
    pub fn from_listing(repos: Vec<Repository>) -> Self {
        let by_id = repos
            .iter()
            .enumerate()
            .map(|(idx, repo)| (repo.id, idx))
            .collect();
        Self { repos, by_id }
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    pub fn repos(&self) -> &[Repository] {
        &self.repos
    }

    /// Clone the current entries, in registry order. Used to hand each
    /// enrichment job its own snapshot.
    pub fn snapshot(&self) -> Vec<Repository> {
        self.repos.clone()
    }

    /// Overwrite the statistics of the repository with the given id.
    /// Returns `false` when the id is unknown to the registry.
    pub fn record_stats(&mut self, id: u64, stats: RepoStats) -> bool {
        match self.by_id.get(&id) {
            Some(&idx) => {
                self.repos[idx].stats = Some(stats);
                true
            }
            None => false,
        }
    }
}

/// Running totals across the whole run; every enrichment job contributes
/// exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub size: u64,
    pub pull_requests: u64,
    pub comments: u64,
}

impl RunTotals {
    pub fn add(&mut self, stats: &RepoStats) {
        self.size += stats.size.repository;
        self.pull_requests += stats.pull_requests.len() as u64;
        self.comments += stats.comment_count;
    }
}
