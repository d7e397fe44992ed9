//! # GitHub REST Client
//!
//! Implements [`ContentSource`] and [`LabelService`] on top of the GitHub v3
//! REST API. Only transport failures and unusable bodies are returned as
//! errors from mutations; their HTTP status is handed back to the reconciler
//! to judge.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client as HttpClient, Method, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{LabelSyncError, Result};
use crate::reference::{RepositoryCoordinates, SpecReference};
use crate::service::{ContentSource, LabelMutation, LabelService, RemoteLabel, RepoContent};
use crate::validate::LabelSpec;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Largest page size the labels endpoint accepts.
const PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct GitHubError {
    message: String,
}

/// GitHub API client for repository contents and labels.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http_client: HttpClient,
    base_url: Url,
    token: String,
}

impl GitHubClient {
    /// Create a client against `base_url` (`https://api.github.com`, or a
    /// GitHub Enterprise `/api/v3` root).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// built.
    pub fn new(token: impl Into<String>, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("labelsync/1.0"));

        let http_client = HttpClient::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        let base_url = Url::parse(base_url).map_err(|e| {
            LabelSyncError::InvalidInput(format!("Invalid API URL {base_url}: {e}"))
        })?;

        Ok(Self {
            http_client,
            base_url,
            token: token.into(),
        })
    }

    /// Build an endpoint URL, percent-encoding each segment.
    fn endpoint<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                LabelSyncError::InvalidInput(format!("Invalid API URL {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn labels_endpoint(&self, repo: &RepositoryCoordinates, name: Option<&str>) -> Result<Url> {
        let base = ["repos", repo.owner.as_str(), repo.repo.as_str(), "labels"];
        self.endpoint(base.into_iter().chain(name))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&LabelSpec>,
    ) -> Result<Response> {
        let mut request = self
            .http_client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token));

        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    async fn api_error(response: Response) -> LabelSyncError {
        let status = response.status().as_u16();
        let message = match response.json::<GitHubError>().await {
            Ok(error) => error.message,
            Err(_) => "unreadable error body".to_string(),
        };
        LabelSyncError::Api { status, message }
    }

    async fn mutation(
        &self,
        method: Method,
        url: Url,
        label: &LabelSpec,
        send_body: bool,
    ) -> Result<LabelMutation> {
        let response = self
            .send(method, url, send_body.then_some(label))
            .await?;
        let status = response.status().as_u16();

        // Echo the label back when the server's answer is not a label
        let label = if response.status().is_success() && status != 204 {
            response
                .json::<RemoteLabel>()
                .await
                .map_or_else(|_| label.clone(), LabelSpec::from)
        } else {
            label.clone()
        };

        Ok(LabelMutation { status, label })
    }
}

#[async_trait]
impl ContentSource for GitHubClient {
    #[instrument(skip(self), fields(reference = %reference))]
    async fn get_content(&self, reference: &SpecReference) -> Result<RepoContent> {
        let segments = ["repos", reference.owner.as_str(), reference.repo.as_str(), "contents"]
            .into_iter()
            .chain(reference.path.split('/').filter(|s| !s.is_empty()));
        let url = self.endpoint(segments)?;

        let response = self.send(Method::GET, url, None).await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(LabelSyncError::FetchFailed {
                reference: reference.to_string(),
                status: status.as_u16(),
            });
        }

        // Directories come back as a JSON array
        let body: serde_json::Value = response.json().await?;
        if body.is_array() {
            return Err(LabelSyncError::NotAFile {
                reference: reference.to_string(),
                kind: "dir".to_string(),
            });
        }

        serde_json::from_value(body).map_err(|e| LabelSyncError::ContentDecode {
            reference: reference.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl LabelService for GitHubClient {
    #[instrument(skip(self), fields(repo = %repo))]
    async fn list_labels(&self, repo: &RepositoryCoordinates) -> Result<Vec<RemoteLabel>> {
        let mut labels = Vec::new();
        let mut page = 1_usize;

        loop {
            let mut url = self.labels_endpoint(repo, None)?;
            url.query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let response = self.send(Method::GET, url, None).await?;
            if !response.status().is_success() {
                return Err(Self::api_error(response).await);
            }

            let batch: Vec<RemoteLabel> = response.json().await?;
            let last_page = batch.len() < PER_PAGE;
            labels.extend(batch);

            if last_page {
                break;
            }
            page += 1;
        }

        debug!(count = labels.len(), pages = page, "Listed repository labels");
        Ok(labels)
    }

    #[instrument(skip(self), fields(repo = %repo))]
    async fn get_label(
        &self,
        repo: &RepositoryCoordinates,
        name: &str,
    ) -> Result<Option<RemoteLabel>> {
        let url = self.labels_endpoint(repo, Some(name))?;
        let response = self.send(Method::GET, url, None).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            _ => Err(Self::api_error(response).await),
        }
    }

    #[instrument(skip(self, label), fields(repo = %repo, label = %label.name))]
    async fn create_label(
        &self,
        repo: &RepositoryCoordinates,
        label: &LabelSpec,
    ) -> Result<LabelMutation> {
        let url = self.labels_endpoint(repo, None)?;
        self.mutation(Method::POST, url, label, true).await
    }

    #[instrument(skip(self, label), fields(repo = %repo, label = %label.name))]
    async fn update_label(
        &self,
        repo: &RepositoryCoordinates,
        label: &LabelSpec,
    ) -> Result<LabelMutation> {
        let url = self.labels_endpoint(repo, Some(&label.name))?;
        self.mutation(Method::PATCH, url, label, true).await
    }

    #[instrument(skip(self, label), fields(repo = %repo, label = %label.name))]
    async fn delete_label(
        &self,
        repo: &RepositoryCoordinates,
        label: &LabelSpec,
    ) -> Result<LabelMutation> {
        let url = self.labels_endpoint(repo, Some(&label.name))?;
        self.mutation(Method::DELETE, url, label, false).await
    }
}
