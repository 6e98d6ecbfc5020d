use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use indicatif::ProgressBar;

use bbs_client::pagination::Paged;
use bbs_client::BitbucketApi;
use bbs_core::error::BbsError;
use bbs_core::models::project::Project;
use bbs_core::models::pull_request::{PullRequest, PullRequestProperties};
use bbs_core::models::registry::RepoRegistry;
use bbs_core::models::repo::{RepoSize, Repository};
use bbs_engine::engine::AuditEngine;

fn project(key: &str) -> Project {
    Project {
        key: key.to_string(),
        id: 1,
        name: key.to_string(),
        public: false,
        kind: "NORMAL".to_string(),
    }
}

fn repo(id: u64, slug: &str, project_key: &str) -> Repository {
    Repository {
        slug: slug.to_string(),
        id,
        name: slug.to_string(),
        state: "AVAILABLE".to_string(),
        forkable: true,
        public: false,
        archived: false,
        project: project(project_key),
        stats: None,
    }
}

fn pull_request(id: u64, comments: u64) -> PullRequest {
    PullRequest {
        id,
        properties: PullRequestProperties {
            comment_count: comments,
        },
    }
}

/// Scripted API double that records how many size lookups are in flight
/// at once.
#[derive(Default)]
struct FakeApi {
    projects: Vec<Project>,
    repos: HashMap<String, Vec<Repository>>,
    sizes: HashMap<String, u64>,
    failing_sizes: Vec<String>,
    pull_requests: HashMap<String, Vec<PullRequest>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[async_trait]
impl BitbucketApi for FakeApi {
    async fn list_projects(&self) -> Paged<Project> {
        Paged {
            values: self.projects.clone(),
            error: None,
        }
    }

    async fn project(&self, key: &str) -> Result<Project, BbsError> {
        self.projects
            .iter()
            .find(|p| p.key == key)
            .cloned()
            .ok_or_else(|| BbsError::Api {
                status: 404,
                endpoint: format!("/projects/{key}"),
            })
    }

    async fn list_repositories(&self, project_key: &str) -> Paged<Repository> {
        Paged {
            values: self.repos.get(project_key).cloned().unwrap_or_default(),
            error: None,
        }
    }

    async fn repository_size(&self, _project_key: &str, slug: &str) -> Result<RepoSize, BbsError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_sizes.iter().any(|s| s == slug) {
            return Err(BbsError::Api {
                status: 500,
                endpoint: format!("/repos/{slug}/sizes"),
            });
        }
        Ok(RepoSize {
            repository: *self.sizes.get(slug).unwrap_or(&0),
            attachments: 0,
        })
    }

    async fn list_pull_requests(&self, _project_key: &str, slug: &str) -> Paged<PullRequest> {
        Paged {
            values: self.pull_requests.get(slug).cloned().unwrap_or_default(),
            error: None,
        }
    }
}

fn engine_for(api: Arc<FakeApi>, threads: usize) -> AuditEngine {
    AuditEngine::new(api, threads, ProgressBar::hidden())
}

#[tokio::test]
async fn batches_bound_concurrency() {
    let slugs = ["r1", "r2", "r3", "r4", "r5", "r6", "r7"];
    let api = Arc::new(FakeApi {
        sizes: slugs.iter().map(|s| (s.to_string(), 1)).collect(),
        delay: Duration::from_millis(50),
        ..FakeApi::default()
    });

    let listed = slugs
        .iter()
        .enumerate()
        .map(|(i, slug)| repo(i as u64 + 1, slug, "PRJ"))
        .collect();
    let registry = RepoRegistry::from_listing(listed);

    let engine = engine_for(Arc::clone(&api), 3);
    let (registry, totals) = engine.enrich(registry).await;

    // 7 repos at width 3 run as generations of 3, 3, 1.
    assert_eq!(api.max_in_flight.load(Ordering::SeqCst), 3);
    assert_eq!(totals.size, 7);
    assert!(registry.repos().iter().all(|r| r.stats.is_some()));
}

#[tokio::test]
async fn totals_match_registry_sum() {
    let api = Arc::new(FakeApi {
        sizes: HashMap::from([
            ("alpha".to_string(), 100),
            ("beta".to_string(), 250),
            ("gamma".to_string(), 7),
        ]),
        pull_requests: HashMap::from([
            (
                "alpha".to_string(),
                vec![pull_request(1, 2), pull_request(2, 3)],
            ),
            ("gamma".to_string(), vec![pull_request(3, 0)]),
        ]),
        ..FakeApi::default()
    });

    let registry = RepoRegistry::from_listing(vec![
        repo(1, "alpha", "PRJ"),
        repo(2, "beta", "PRJ"),
        repo(3, "gamma", "PRJ"),
    ]);

    let engine = engine_for(api, 2);
    let (registry, totals) = engine.enrich(registry).await;

    assert_eq!(totals.size, 357);
    assert_eq!(totals.pull_requests, 3);
    assert_eq!(totals.comments, 5);

    let mut size_sum = 0;
    let mut comment_sum = 0;
    for r in registry.repos() {
        let stats = r.stats.as_ref().unwrap();
        size_sum += stats.size.repository;
        comment_sum += stats.comment_count;
    }
    assert_eq!(size_sum, totals.size);
    assert_eq!(comment_sum, totals.comments);
}

#[tokio::test]
async fn size_failure_is_isolated_to_its_repository() {
    let api = Arc::new(FakeApi {
        sizes: HashMap::from([("good".to_string(), 10), ("fine".to_string(), 20)]),
        failing_sizes: vec!["broken".to_string()],
        pull_requests: HashMap::from([(
            "broken".to_string(),
            vec![pull_request(1, 4)],
        )]),
        ..FakeApi::default()
    });

    let registry = RepoRegistry::from_listing(vec![
        repo(1, "good", "PRJ"),
        repo(2, "broken", "PRJ"),
        repo(3, "fine", "PRJ"),
    ]);

    let engine = engine_for(api, 3);
    let (registry, totals) = engine.enrich(registry).await;

    // The failed lookup leaves a zeroed size but the job still completes
    // and its pull requests are kept.
    let broken = &registry.repos()[1];
    let stats = broken.stats.as_ref().unwrap();
    assert_eq!(stats.size.repository, 0);
    assert_eq!(stats.comment_count, 4);

    assert_eq!(totals.size, 30);
    assert_eq!(totals.comments, 4);
    assert!(registry.repos().iter().all(|r| r.stats.is_some()));
}

#[tokio::test]
async fn empty_registry_completes_immediately() {
    let engine = engine_for(Arc::new(FakeApi::default()), 5);
    let (registry, totals) = engine.enrich(RepoRegistry::from_listing(Vec::new())).await;

    assert!(registry.is_empty());
    assert_eq!(totals, Default::default());
}

#[tokio::test]
async fn collect_orders_repositories_by_project() {
    let api = Arc::new(FakeApi {
        projects: vec![project("ONE"), project("TWO")],
        repos: HashMap::from([
            (
                "ONE".to_string(),
                vec![repo(1, "one-a", "ONE"), repo(2, "one-b", "ONE")],
            ),
            ("TWO".to_string(), vec![repo(3, "two-a", "TWO")]),
        ]),
        ..FakeApi::default()
    });

    let engine = engine_for(Arc::clone(&api), 1);
    let (projects, registry) = engine.collect(None).await.unwrap();

    assert_eq!(projects.len(), 2);
    let slugs: Vec<&str> = registry.repos().iter().map(|r| r.slug.as_str()).collect();
    assert_eq!(slugs, vec!["one-a", "one-b", "two-a"]);

    // Filtering narrows the inventory to one project.
    let (projects, registry) = engine.collect(Some("TWO")).await.unwrap();
    assert_eq!(projects[0].key, "TWO");
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn collect_fails_when_no_projects_exist() {
    let engine = engine_for(Arc::new(FakeApi::default()), 1);
    let err = engine.collect(None).await.unwrap_err();
    assert!(matches!(err, BbsError::NoProjects));
}
