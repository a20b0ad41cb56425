use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::github::types::Release;

use super::capabilities::{CommentApi, LabelApi, NewTag, ReleaseApi, Repository, TagApi};

/// Wraps a platform so reads go through and writes are only logged.
pub struct DryRun<P> {
    inner: P,
}

impl<P> DryRun<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: ReleaseApi> ReleaseApi for DryRun<P> {
    async fn list_releases(&self, repo: &Repository) -> Result<Vec<Release>> {
        self.inner.list_releases(repo).await
    }

    async fn create_release(
        &self,
        repo: &Repository,
        tag_name: &str,
        display_name: &str,
    ) -> Result<Release> {
        info!(
            owner = %repo.owner,
            repo = %repo.name,
            tag = tag_name,
            name = display_name,
            "[dry-run] would create release"
        );
        Ok(Release {
            tag_name: tag_name.to_string(),
            name: display_name.to_string(),
            html_url: format!("dry-run://{}", tag_name),
        })
    }
}

#[async_trait]
impl<P: Send + Sync> TagApi for DryRun<P> {
    async fn create_tag(&self, repo: &Repository, tag: &NewTag) -> Result<String> {
        info!(
            owner = %repo.owner,
            repo = %repo.name,
            tag = %tag.name,
            sha = %tag.sha,
            tagger = %tag.tagger.name,
            "[dry-run] would create tag"
        );
        Ok(tag.name.clone())
    }
}

#[async_trait]
impl<P: Send + Sync> LabelApi for DryRun<P> {
    async fn add_label(&self, repo: &Repository, issue: u64, label: &str) -> Result<()> {
        info!(repo = %repo.name, issue, label, "[dry-run] would add label");
        Ok(())
    }

    async fn remove_label(&self, repo: &Repository, issue: u64, label: &str) -> Result<()> {
        info!(repo = %repo.name, issue, label, "[dry-run] would remove label");
        Ok(())
    }
}

#[async_trait]
impl<P: Send + Sync> CommentApi for DryRun<P> {
    async fn create_comment(&self, repo: &Repository, issue: u64, body: &str) -> Result<()> {
        info!(repo = %repo.name, issue, body, "[dry-run] would comment");
        Ok(())
    }
}
