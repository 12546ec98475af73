//! The GitHub GraphQL fetcher (C5). Unlike the REST fetcher, anonymous
//! access isn't supported here; a token is required to construct one.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use serde_json::json;

use super::{RepositoryFetcher, classify_http_error};
use crate::error::FetchError;

const QUERY: &str = r#"
query($owner: String!, $repo: String!, $expression: String!) {
  repository(owner: $owner, name: $repo) {
    object(expression: $expression) {
      ... on Blob { text }
    }
  }
}
"#;

pub struct GitHubGraphqlFetcher {
    client: reqwest::Client,
    token: String,
}

impl GitHubGraphqlFetcher {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }
}

#[derive(Deserialize)]
struct Response {
    data: Option<Data>,
}

#[derive(Deserialize)]
struct Data {
    repository: Option<RepositoryNode>,
}

#[derive(Deserialize)]
struct RepositoryNode {
    object: Option<Blob>,
}

#[derive(Deserialize)]
struct Blob {
    text: Option<String>,
}

#[async_trait]
impl RepositoryFetcher for GitHubGraphqlFetcher {
    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        r#ref: &str,
        path: &str,
    ) -> Result<String, FetchError> {
        let expression = format!("{ref}:{path}");
        let body = json!({
            "query": QUERY,
            "variables": { "owner": owner, "repo": repo, "expression": expression },
        });

        let response = self
            .client
            .post("https://api.github.com/graphql")
            .header(AUTHORIZATION, format!("Bearer {token}", token = self.token))
            .header(USER_AGENT, "ghacheck")
            .json(&body)
            .send()
            .await
            .map_err(|err| FetchError::NetworkError(err.to_string()))?;

        if !response.status().is_success() {
            return Err(classify_http_error(response.status(), response.headers()));
        }

        let parsed: Response = response
            .json()
            .await
            .map_err(|err| FetchError::NetworkError(err.to_string()))?;

        parsed
            .data
            .and_then(|d| d.repository)
            .and_then(|r| r.object)
            .and_then(|o| o.text)
            .ok_or(FetchError::GitHubApiNotFound)
    }
}
