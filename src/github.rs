//! Thin client for the GitHub contents API: raw reads through
//! `raw.githubusercontent.com`, writes through the REST contents endpoint
//! with an optimistic blob-sha check.

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use crate::store::StoreError;

const USER_AGENT: &str = concat!("places-server/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    repo: String,
    branch: String,
    token: String,
    api_base: String,
    raw_base: String,
}

#[derive(Debug, Deserialize)]
struct ContentsInfo {
    sha: String,
}

impl GithubClient {
    pub fn new(repo: &str, branch: &str, token: &str) -> Self {
        Self::with_bases(
            repo,
            branch,
            token,
            "https://api.github.com",
            "https://raw.githubusercontent.com",
        )
    }

    /// Base URLs are injectable so tests can point at a stub server.
    pub fn with_bases(repo: &str, branch: &str, token: &str, api_base: &str, raw_base: &str) -> Self {
        Self {
            client: Client::new(),
            repo: repo.to_string(),
            branch: branch.to_string(),
            token: token.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            raw_base: raw_base.trim_end_matches('/').to_string(),
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_base,
            self.repo,
            path.trim_start_matches('/'),
        )
    }

    fn raw_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.raw_base,
            self.repo,
            self.branch,
            path.trim_start_matches('/'),
        )
    }

    /// Fetch the raw file content from the target branch. `Ok(None)` when the
    /// path does not exist or the store answers with a non-success status.
    pub async fn fetch_raw(&self, path: &str) -> Result<Option<String>, StoreError> {
        let resp = self
            .client
            .get(self.raw_url(path))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(Some(resp.text().await?))
        } else {
            Ok(None)
        }
    }

    /// Look up the current blob sha for a path on the target branch. A
    /// missing path yields `Ok(None)`, which makes the next write a create.
    pub async fn fetch_sha(&self, path: &str) -> Result<Option<String>, StoreError> {
        let url = format!(
            "{}?ref={}",
            self.contents_url(path),
            urlencoding::encode(&self.branch),
        );
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        if resp.status().is_success() {
            let info: ContentsInfo = resp.json().await?;
            Ok(Some(info.sha))
        } else {
            Ok(None)
        }
    }

    /// PUT file contents, attaching the revision sha when overwriting an
    /// existing path. Last write wins; a rejected sha is surfaced as a write
    /// failure, never retried.
    pub async fn put_contents(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        sha: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut payload = serde_json::json!({
            "message": message,
            "branch": self.branch,
            "content": base64::engine::general_purpose::STANDARD.encode(content),
        });
        if let Some(sha) = sha {
            payload["sha"] = serde_json::Value::String(sha.to_string());
        }

        let resp = self
            .client
            .put(self.contents_url(path))
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&payload)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(StoreError::Write(format!(
                "GitHub commit failed ({status}): {body}"
            )))
        }
    }

    /// Fetch the sha immediately before writing, then commit in one step.
    /// The sha from any earlier read is deliberately not reused.
    pub async fn commit(&self, path: &str, content: &[u8], message: &str) -> Result<(), StoreError> {
        let sha = self.fetch_sha(path).await?;
        self.put_contents(path, content, message, sha.as_deref()).await
    }
}
