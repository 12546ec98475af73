//! The GitHub REST Contents API fetcher (C5).

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};

use super::{RepositoryFetcher, classify_http_error};
use crate::error::FetchError;

pub struct GitHubRestFetcher {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubRestFetcher {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: "https://api.github.com".into(),
            token,
        }
    }
}

#[async_trait]
impl RepositoryFetcher for GitHubRestFetcher {
    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        r#ref: &str,
        path: &str,
    ) -> Result<String, FetchError> {
        let url = format!(
            "{base}/repos/{owner}/{repo}/contents/{path}",
            base = self.api_base
        );

        let mut request = self
            .client
            .get(&url)
            .query(&[("ref", r#ref)])
            .header(ACCEPT, "application/vnd.github.v3.raw")
            .header(USER_AGENT, "ghacheck");

        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|err| FetchError::NetworkError(err.to_string()))?;

        if !response.status().is_success() {
            return Err(classify_http_error(response.status(), response.headers()));
        }

        response
            .text()
            .await
            .map_err(|err| FetchError::NetworkError(err.to_string()))
    }
}
