use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Errors produced while validating a request path
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Invalid request path: expected /{{owner}}/{{repo}}/{{path}}")]
    Malformed,

    #[error("Hidden path segment not allowed: {0}")]
    HiddenSegment(String),
}

/// A request path split into its repository coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPath<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
    pub path: &'a str,
}

impl<'a> ContentPath<'a> {
    /// First segment of the decoded file path that names a hidden entry, if any.
    ///
    /// Segments are split after percent-decoding, so an encoded `%2F` separates
    /// segments too. Owner and repository are not checked, so `.github`
    /// repositories stay reachable.
    pub fn hidden_segment(&self) -> Option<String> {
        let decoded = percent_decode_str(self.path).decode_utf8_lossy();
        decoded
            .split('/')
            .find(|segment| is_hidden_segment(segment))
            .map(str::to_string)
    }

    /// Reject paths that reach into hidden files or directories.
    pub fn ensure_visible(&self) -> Result<(), PathError> {
        match self.hidden_segment() {
            Some(segment) => Err(PathError::HiddenSegment(segment)),
            None => Ok(()),
        }
    }
}

/// Split `/owner/repo/path/to/file` into its three parts.
pub fn parse_content_path(uri_path: &str) -> Result<ContentPath<'_>, PathError> {
    let trimmed = uri_path.strip_prefix('/').unwrap_or(uri_path);
    let mut parts = trimmed.splitn(3, '/');

    let owner = parts.next().unwrap_or_default();
    let repo = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or_default();

    if owner.is_empty() || repo.is_empty() || path.is_empty() {
        return Err(PathError::Malformed);
    }

    Ok(ContentPath { owner, repo, path })
}

/// A decoded segment is hidden when it starts with `.`.
pub fn is_hidden_segment(segment: &str) -> bool {
    segment.starts_with('.')
}
