//! GitHub pull request creator using the REST API

use super::{PullRequestCreator, PullRequestMessage, PullRequestRequest};
use crate::domain::{git_token_for, Credential, Provider, PullRequest};
use crate::error::{AppError, PullRequestError};
use crate::registry::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const API_URL: &str = "https://api.github.com";
const PROVIDER: &str = "GitHub";
const FILE_MODE: &str = "100644";

#[derive(Debug, Serialize, PartialEq)]
struct TreeEntry<'a> {
    path: String,
    mode: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct Sha {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitCommit {
    tree: Sha,
}

#[derive(Debug, Deserialize)]
struct Repository {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPull {
    number: u64,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
}

/// Transport for GitHub REST calls
#[async_trait]
trait GithubApi: Send + Sync {
    /// Send one request and return the decoded JSON body
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, PullRequestError>;
}

/// `GithubApi` over HTTPS with a bearer token
struct RestApi {
    client: Client,
    api_url: String,
}

impl RestApi {
    fn new(token: &str, api_url: String) -> Result<Self, PullRequestError> {
        let host = Provider::Github.hostname();
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            PullRequestError::MissingCredentials {
                host: host.to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PullRequestError::Network {
                provider: PROVIDER.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GithubApi for RestApi {
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, PullRequestError> {
        let url = format!("{}{}", self.api_url, endpoint);
        log::debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.map_err(|e| PullRequestError::Network {
            provider: PROVIDER.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(api_error(endpoint, status, message));
        }

        response.json::<Value>().await.map_err(|e| PullRequestError::Api {
            provider: PROVIDER.to_string(),
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message: format!("unexpected response: {}", e),
        })
    }
}

/// Opens pull requests on github.com
pub struct GithubCreator {
    api: Box<dyn GithubApi>,
}

impl GithubCreator {
    /// Create a creator authenticated with the github.com credential
    pub fn new(credentials: &[Credential]) -> Result<Self, AppError> {
        Self::with_api_url(credentials, API_URL)
    }

    /// Create a creator against a custom API root
    pub fn with_api_url(
        credentials: &[Credential],
        api_url: impl Into<String>,
    ) -> Result<Self, AppError> {
        let host = Provider::Github.hostname();
        let token = git_token_for(credentials, host).ok_or_else(|| {
            PullRequestError::MissingCredentials {
                host: host.to_string(),
            }
        })?;

        Ok(Self {
            api: Box::new(RestApi::new(token, api_url.into())?),
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<T, PullRequestError> {
        let value = self.api.call(method, endpoint, body).await?;
        serde_json::from_value(value).map_err(|e| PullRequestError::InvalidResponse {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    async fn base_branch(&self, request: &PullRequestRequest) -> Result<String, PullRequestError> {
        if let Some(branch) = &request.source.branch {
            return Ok(branch.clone());
        }
        let repo: Repository = self
            .send(Method::GET, &format!("/repos/{}", request.source.repo), None)
            .await?;
        Ok(repo.default_branch)
    }

    async fn create_branch(
        &self,
        request: &PullRequestRequest,
        message: &PullRequestMessage,
    ) -> Result<(), PullRequestError> {
        let repo = &request.source.repo;
        let base: GitCommit = self
            .send(
                Method::GET,
                &format!("/repos/{}/git/commits/{}", repo, request.base_commit),
                None,
            )
            .await?;

        let tree: Sha = self
            .send(
                Method::POST,
                &format!("/repos/{}/git/trees", repo),
                Some(json!({
                    "base_tree": base.tree.sha,
                    "tree": tree_entries(request),
                })),
            )
            .await?;

        let commit: Sha = self
            .send(
                Method::POST,
                &format!("/repos/{}/git/commits", repo),
                Some(json!({
                    "message": message.commit_message,
                    "tree": tree.sha,
                    "parents": [request.base_commit],
                })),
            )
            .await?;

        let created: Result<Value, _> = self
            .send(
                Method::POST,
                &format!("/repos/{}/git/refs", repo),
                Some(json!({
                    "ref": format!("refs/heads/{}", message.branch),
                    "sha": commit.sha,
                })),
            )
            .await;
        match created {
            Err(PullRequestError::Api { status: 422, .. }) => {
                Err(PullRequestError::BranchAlreadyExists {
                    branch: message.branch.clone(),
                })
            }
            other => other.map(|_| ()),
        }
    }

    async fn assign(&self, repo: &str, number: u64, ids: &[u64]) -> Result<(), PullRequestError> {
        let mut logins = Vec::new();
        for id in ids {
            let user: User = self.send(Method::GET, &format!("/user/{}", id), None).await?;
            logins.push(user.login);
        }
        let _: Value = self
            .send(
                Method::POST,
                &format!("/repos/{}/issues/{}/assignees", repo, number),
                Some(json!({ "assignees": logins })),
            )
            .await?;
        Ok(())
    }

    async fn label(
        &self,
        repo: &str,
        number: u64,
        labels: Vec<String>,
    ) -> Result<(), PullRequestError> {
        let _: Value = self
            .send(
                Method::POST,
                &format!("/repos/{}/issues/{}/labels", repo, number),
                Some(json!({ "labels": labels })),
            )
            .await?;
        Ok(())
    }
}

fn api_error(endpoint: &str, status: StatusCode, message: String) -> PullRequestError {
    PullRequestError::Api {
        provider: PROVIDER.to_string(),
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        message,
    }
}

fn tree_entries(request: &PullRequestRequest) -> Vec<TreeEntry<'_>> {
    request
        .files
        .iter()
        .map(|file| TreeEntry {
            path: file.repo_path(),
            mode: FILE_MODE,
            kind: "blob",
            content: &file.content,
        })
        .collect()
}

#[async_trait]
impl PullRequestCreator for GithubCreator {
    async fn create(&self, request: &PullRequestRequest) -> Result<PullRequest, AppError> {
        if request.base_commit.is_empty() {
            return Err(PullRequestError::MissingBaseCommit.into());
        }

        let message = PullRequestMessage::build(request);
        let base = self.base_branch(request).await?;
        self.create_branch(request, &message).await?;

        let repo = &request.source.repo;
        let pull: CreatedPull = self
            .send(
                Method::POST,
                &format!("/repos/{}/pulls", repo),
                Some(json!({
                    "title": message.title,
                    "body": message.body,
                    "head": message.branch,
                    "base": base,
                })),
            )
            .await?;
        log::debug!("opened pull request #{}", pull.number);

        // The pull request exists from here on; later failures only warn
        if !request.assignees.is_empty() {
            if let Err(e) = self.assign(repo, pull.number, &request.assignees).await {
                log::warn!("could not assign pull request #{}: {}", pull.number, e);
            }
        }
        if let Err(e) = self.label(repo, pull.number, request.labels()).await {
            log::warn!("could not label pull request #{}: {}", pull.number, e);
        }

        Ok(PullRequest {
            number: pull.number,
            url: pull.html_url,
            branch: message.branch,
            title: message.title,
        })
    }
}
