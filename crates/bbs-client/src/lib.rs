pub mod pagination;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use bbs_core::config::RunConfig;
use bbs_core::error::BbsError;
use bbs_core::models::project::Project;
use bbs_core::models::pull_request::PullRequest;
use bbs_core::models::repo::{RepoSize, Repository};

use crate::pagination::{fetch_all, Paged};

/// Prefix for versioned REST endpoints. The `sizes` lookup is served from
/// the site root instead.
const API_PREFIX: &str = "/rest/api/1.0";

/// Read side of the Bitbucket Server API used by the audit engine.
#[async_trait]
pub trait BitbucketApi: Send + Sync {
    /// List every project on the server (handles pagination).
    async fn list_projects(&self) -> Paged<Project>;

    /// Look up a single project by key.
    async fn project(&self, key: &str) -> Result<Project, BbsError>;

    /// List every repository of a project (handles pagination).
    async fn list_repositories(&self, project_key: &str) -> Paged<Repository>;

    /// Look up the disk usage of one repository.
    async fn repository_size(&self, project_key: &str, slug: &str) -> Result<RepoSize, BbsError>;

    /// List every pull request of a repository across all states (handles
    /// pagination).
    async fn list_pull_requests(&self, project_key: &str, slug: &str) -> Paged<PullRequest>;
}

/// HTTP implementation of [`BitbucketApi`] against a live server.
pub struct BbsClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    page_limit: u64,
}

impl BbsClient {
    pub fn new(config: &RunConfig) -> Result<Self, BbsError> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(config.insecure);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| BbsError::Transport {
            message: e.to_string(),
        })?;

        Ok(Self {
            http,
            base_url: config
                .server_url
                .as_str()
                .trim_end_matches('/')
                .to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            page_limit: config.page_limit,
        })
    }

    /// One authenticated GET; returns the body on HTTP 200 and a typed
    /// error on anything else. No retries.
    async fn get_text(&self, path: &str, endpoint: &str) -> Result<String, BbsError> {
        let url = format!("{}{path}{endpoint}", self.base_url);
        debug!(%url, "requesting URI");

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| BbsError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(BbsError::Api {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }

        response.text().await.map_err(|e| BbsError::Transport {
            message: e.to_string(),
        })
    }

    pub(crate) async fn get_api(&self, endpoint: &str) -> Result<String, BbsError> {
        self.get_text(API_PREFIX, endpoint).await
    }

    pub(crate) async fn get_server(&self, endpoint: &str) -> Result<String, BbsError> {
        self.get_text("", endpoint).await
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, BbsError> {
    serde_json::from_str(body).map_err(|e| BbsError::Decode {
        message: e.to_string(),
    })
}

#[async_trait]
impl BitbucketApi for BbsClient {
    async fn list_projects(&self) -> Paged<Project> {
        fetch_all(self, |start| {
            format!("/projects?limit={}&start={start}", self.page_limit)
        })
        .await
    }

    async fn project(&self, key: &str) -> Result<Project, BbsError> {
        let body = self.get_api(&format!("/projects/{key}")).await?;
        decode(&body)
    }

    async fn list_repositories(&self, project_key: &str) -> Paged<Repository> {
        fetch_all(self, |start| {
            format!(
                "/projects/{project_key}/repos?limit={}&start={start}",
                self.page_limit
            )
        })
        .await
    }

    async fn repository_size(&self, project_key: &str, slug: &str) -> Result<RepoSize, BbsError> {
        let body = self
            .get_server(&format!("/projects/{project_key}/repos/{slug}/sizes"))
            .await?;
        decode(&body)
    }

    async fn list_pull_requests(&self, project_key: &str, slug: &str) -> Paged<PullRequest> {
        fetch_all(self, |start| {
            format!(
                "/projects/{project_key}/repos/{slug}/pull-requests?state=all&limit={}&start={start}",
                self.page_limit
            )
        })
        .await
    }
}
