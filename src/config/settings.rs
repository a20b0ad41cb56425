use std::fmt;

use crate::error::BotError;
use crate::release::capabilities::Repository;

/// Required process inputs. The branch values are accepted but not used by
/// any release decision.
#[derive(Clone)]
pub struct Settings {
    pub repo_owner: String,
    pub repo_name: String,
    pub base_branch: String,
    pub target_branch: String,
    pub token: String,
}

impl Settings {
    pub fn new(
        repo_owner: Option<String>,
        repo_name: Option<String>,
        base_branch: Option<String>,
        target_branch: Option<String>,
        token: Option<String>,
    ) -> Result<Self, BotError> {
        Ok(Settings {
            repo_owner: require(repo_owner, "repo owner")?,
            repo_name: require(repo_name, "repo name")?,
            base_branch: require(base_branch, "base branch")?,
            target_branch: require(target_branch, "target branch")?,
            token: require(token, "github token")?,
        })
    }

    pub fn repository(&self) -> Repository {
        Repository {
            owner: self.repo_owner.clone(),
            name: self.repo_name.clone(),
        }
    }
}

fn require(value: Option<String>, what: &str) -> Result<String, BotError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(BotError::Config(format!("missing {}", what))),
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("repo_owner", &self.repo_owner)
            .field("repo_name", &self.repo_name)
            .field("base_branch", &self.base_branch)
            .field("target_branch", &self.target_branch)
            .field("token", &"<redacted>")
            .finish()
    }
}
