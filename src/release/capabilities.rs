//! Platform operations the release flow depends on.
//!
//! Each trait is a narrow slice of the remote API so tests can mock exactly
//! the calls a scenario is expected to make.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::github::types::Release;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagger {
    pub name: String,
    pub email: String,
}

/// An annotated tag object to be created on `sha`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub name: String,
    pub message: String,
    pub sha: String,
    pub tagger: Tagger,
    pub date: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseApi: Send + Sync {
    /// Releases in platform order, most recent first.
    async fn list_releases(&self, repo: &Repository) -> Result<Vec<Release>>;

    async fn create_release(
        &self,
        repo: &Repository,
        tag_name: &str,
        display_name: &str,
    ) -> Result<Release>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagApi: Send + Sync {
    /// Returns the name of the created tag.
    async fn create_tag(&self, repo: &Repository, tag: &NewTag) -> Result<String>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LabelApi: Send + Sync {
    async fn add_label(&self, repo: &Repository, issue: u64, label: &str) -> Result<()>;
    async fn remove_label(&self, repo: &Repository, issue: u64, label: &str) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentApi: Send + Sync {
    async fn create_comment(&self, repo: &Repository, issue: u64, body: &str) -> Result<()>;
}

/// The set of platform operations handed to the orchestrator.
pub struct Capabilities<'a> {
    pub releases: &'a dyn ReleaseApi,
    pub tags: &'a dyn TagApi,
    pub labels: &'a dyn LabelApi,
    pub comments: &'a dyn CommentApi,
}

impl<'a> Capabilities<'a> {
    pub fn from_platform<P>(platform: &'a P) -> Self
    where
        P: ReleaseApi + TagApi + LabelApi + CommentApi,
    {
        Capabilities {
            releases: platform,
            tags: platform,
            labels: platform,
            comments: platform,
        }
    }
}
