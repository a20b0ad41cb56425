use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::types::{BotConfig, LabelsConfig, ReleaseConfig};
use crate::error::BotError;
use crate::github::types::{PullRequest, PullRequestAction, PullRequestEvent};

use super::capabilities::{Capabilities, NewTag, Repository, Tagger};
use super::version::VersionResolver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ignored(IgnoreReason),
    /// Closed without merging: the pending label was dropped.
    PendingLabelCleared,
    Released { tag: String, url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotClosed(PullRequestAction),
    NotMarkedForRelease,
}

/// Drives one pull request event through the release sequence.
///
/// Steps run strictly in order and stop at the first failure. Nothing that
/// already happened is undone: a failed release after the label swap leaves
/// the pull request labeled as merged with no release.
pub struct ReleaseOrchestrator {
    repo: Repository,
    labels: LabelsConfig,
    release: ReleaseConfig,
    tagger: Tagger,
    resolver: VersionResolver,
}

impl ReleaseOrchestrator {
    pub fn new(repo: Repository, config: &BotConfig) -> Self {
        Self {
            repo,
            labels: config.labels.clone(),
            release: config.release.clone(),
            tagger: Tagger {
                name: config.tagger.name.clone(),
                email: config.tagger.email.clone(),
            },
            resolver: VersionResolver::new(config.release.increment),
        }
    }

    pub async fn handle_event(
        &self,
        caps: &Capabilities<'_>,
        event: &PullRequestEvent,
    ) -> Result<Outcome, BotError> {
        let pr = &event.pull_request;

        match event.action {
            PullRequestAction::Closed => {}
            PullRequestAction::Unhandled => {
                warn!(pr = pr.number, "unrecognized pull request action, skipping");
                return Ok(Outcome::Ignored(IgnoreReason::NotClosed(event.action)));
            }
            action => {
                info!(pr = pr.number, %action, "pull request not closed, nothing to do");
                return Ok(Outcome::Ignored(IgnoreReason::NotClosed(action)));
            }
        }

        if !pr.has_label(&self.labels.pending) {
            info!(
                pr = pr.number,
                label = %self.labels.pending,
                "pull request not marked for release"
            );
            return Ok(Outcome::Ignored(IgnoreReason::NotMarkedForRelease));
        }

        if pr.merged {
            self.release_merged(caps, pr).await
        } else {
            self.clear_pending(caps, pr).await?;
            Ok(Outcome::PendingLabelCleared)
        }
    }

    async fn clear_pending(
        &self,
        caps: &Capabilities<'_>,
        pr: &PullRequest,
    ) -> Result<(), BotError> {
        info!(pr = pr.number, label = %self.labels.pending, "removing label");
        caps.labels
            .remove_label(&self.repo, pr.number, &self.labels.pending)
            .await
            .map_err(|e| BotError::remote("remove label", e))
    }

    /// Remove-then-add. A failed removal skips the add, so the pull request
    /// ends up unlabeled rather than carrying both labels.
    async fn swap_to_merged(
        &self,
        caps: &Capabilities<'_>,
        pr: &PullRequest,
    ) -> Result<(), BotError> {
        self.clear_pending(caps, pr).await?;

        info!(pr = pr.number, label = %self.labels.merged, "adding label");
        caps.labels
            .add_label(&self.repo, pr.number, &self.labels.merged)
            .await
            .map_err(|e| BotError::remote("add label", e))
    }

    async fn release_merged(
        &self,
        caps: &Capabilities<'_>,
        pr: &PullRequest,
    ) -> Result<Outcome, BotError> {
        self.swap_to_merged(caps, pr).await?;

        let releases = caps
            .releases
            .list_releases(&self.repo)
            .await
            .map_err(|e| BotError::remote("list releases", e))?;
        let tags: Vec<&str> = releases.iter().map(|r| r.tag_name.as_str()).collect();
        debug!(latest = ?tags.first(), count = tags.len(), "fetched existing releases");

        let next = self.resolver.next_tag(&tags)?;

        info!(tag = %next, sha = %pr.head_sha(), "creating tag");
        let tag = caps
            .tags
            .create_tag(
                &self.repo,
                &NewTag {
                    name: next.clone(),
                    message: next.clone(),
                    sha: pr.head_sha().to_string(),
                    tagger: self.tagger.clone(),
                    date: Utc::now(),
                },
            )
            .await
            .map_err(|e| BotError::remote("create tag", e))?;

        let display_name = format!("{}{}", self.release.name_prefix, tag);
        info!(tag = %tag, name = %display_name, "creating release");
        let release = caps
            .releases
            .create_release(&self.repo, &tag, &display_name)
            .await
            .map_err(|e| BotError::remote("create release", e))?;

        let body = format!("{} {}", self.release.comment_prefix, release.html_url);
        info!(
            pr = pr.number,
            release = %release.name,
            url = %release.html_url,
            "posting release comment"
        );
        caps.comments
            .create_comment(&self.repo, pr.number, &body)
            .await
            .map_err(|e| BotError::remote("create comment", e))?;

        Ok(Outcome::Released {
            tag,
            url: release.html_url,
        })
    }
}
