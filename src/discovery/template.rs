//! Deterministic slide addressing.
//!
//! A slot's candidate URL is `{root}/{prefix}{slot:03}{suffix}{extension}`.

use url::Url;

use super::suffix::SuffixVariant;
use crate::error::TemplateError;

/// Base location used when a deck lives in a GitHub repository.
pub const GITHUB_RAW_HOST: &str = "https://raw.githubusercontent.com";

/// Filename template rooted at a remote base URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlideTemplate {
    root: String,
    prefix: String,
    extension: String,
}

/// One `(slot, suffix, url)` triple tried during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub slot: u32,
    pub suffix: SuffixVariant,
    pub file_name: String,
    pub url: String,
}

impl SlideTemplate {
    /// Create a template.
    ///
    /// `root` must be an absolute `http` or `https` URL; a trailing slash is
    /// ignored.
    pub fn new(
        root: &str,
        prefix: impl Into<String>,
        extension: impl Into<String>,
    ) -> Result<Self, TemplateError> {
        let parsed = Url::parse(root).map_err(|e| TemplateError::InvalidRoot {
            root: root.to_string(),
            message: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TemplateError::InvalidRoot {
                root: root.to_string(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self {
            root: root.trim_end_matches('/').to_string(),
            prefix: prefix.into(),
            extension: extension.into(),
        })
    }

    /// Template for a folder in a GitHub repository, served raw.
    pub fn github_raw(
        owner: &str,
        repo: &str,
        branch: &str,
        folder: &str,
        prefix: impl Into<String>,
        extension: impl Into<String>,
    ) -> Result<Self, TemplateError> {
        Self::new(&github_raw_root(owner, repo, branch, folder), prefix, extension)
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// File name for a slot and suffix, e.g. `260112.013a.png`.
    pub fn file_name(&self, slot: u32, suffix: SuffixVariant) -> String {
        format!(
            "{}{:03}{}{}",
            self.prefix,
            slot,
            suffix.as_suffix(),
            self.extension
        )
    }

    /// Absolute URL of a file below the root.
    ///
    /// Each `/`-separated segment is percent-encoded on its own, so a prefix
    /// such as `Ch01/F25.` addresses a subfolder.
    pub fn url_for(&self, file_name: &str) -> String {
        let path: Vec<_> = file_name.split('/').map(urlencoding::encode).collect();
        format!("{}/{}", self.root, path.join("/"))
    }

    pub fn candidate(&self, slot: u32, suffix: SuffixVariant) -> Candidate {
        let file_name = self.file_name(slot, suffix);
        let url = self.url_for(&file_name);
        Candidate {
            slot,
            suffix,
            file_name,
            url,
        }
    }

    /// Human readable pattern used in messages, e.g. `https://host/deck/F25_Ch01.###.png`.
    pub fn pattern(&self) -> String {
        format!("{}/{}###{}", self.root, self.prefix, self.extension)
    }
}

/// `https://raw.githubusercontent.com/{owner}/{repo}/{branch}/{folder}`
pub fn github_raw_root(owner: &str, repo: &str, branch: &str, folder: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        format!("{}/{}/{}/{}", GITHUB_RAW_HOST, owner, repo, branch)
    } else {
        format!("{}/{}/{}/{}/{}", GITHUB_RAW_HOST, owner, repo, branch, folder)
    }
}
