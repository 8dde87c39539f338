use bytes::Bytes;
use reqwest::{Response, StatusCode};

use super::GitHubClient;
use crate::content::{ContentFuture, ContentProvider, FetchError, FileMetadata};

impl GitHubClient {
    /// Metadata (and inline payload for small files) of `path` in `owner/repo`.
    pub async fn file_metadata(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        token: &str,
    ) -> Result<FileMetadata, FetchError> {
        let resp = self
            .get(&format!("/repos/{owner}/{repo}/contents/{path}"), token)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let resp = check_status(resp)?;

        // Directories come back as JSON arrays and fail here.
        resp.json()
            .await
            .map_err(|e| FetchError::Upstream(format!("failed to parse file data: {e}")))
    }

    /// Raw bytes behind a `download_url`.
    pub async fn download_file(&self, download_ref: &str, token: &str) -> Result<Bytes, FetchError> {
        let resp = self
            .http
            .get(download_ref)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let resp = check_status(resp)?;

        resp.bytes()
            .await
            .map_err(|e| FetchError::Transport(format!("failed to read download response: {e}")))
    }
}

fn check_status(resp: Response) -> Result<Response, FetchError> {
    match resp.status() {
        status if status.is_success() => Ok(resp),
        StatusCode::NOT_FOUND => Err(FetchError::NotFound),
        status => Err(FetchError::Upstream(status.to_string())),
    }
}

impl ContentProvider for GitHubClient {
    fn get_metadata<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        path: &'a str,
        token: &'a str,
    ) -> ContentFuture<'a, FileMetadata> {
        Box::pin(self.file_metadata(owner, repo, path, token))
    }

    fn download<'a>(&'a self, download_ref: &'a str, token: &'a str) -> ContentFuture<'a, Bytes> {
        Box::pin(self.download_file(download_ref, token))
    }
}
