use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::BotError;

pub const SEED_TAG: &str = "v0.0.1";

/// Components at or above this value roll over into the next one.
const ROLLOVER_AT: u64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncrementPolicy {
    /// Bump PATCH; PATCH rolls into MINOR and MINOR into MAJOR at 10.
    #[default]
    Rollover,
    /// Bump MINOR and reset PATCH, MAJOR untouched.
    MinorOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn bump(self, policy: IncrementPolicy) -> Version {
        let Version {
            mut major,
            mut minor,
            mut patch,
        } = self;

        match policy {
            IncrementPolicy::Rollover => {
                patch += 1;
                if patch >= ROLLOVER_AT {
                    patch = 0;
                    minor += 1;
                }
                if minor >= ROLLOVER_AT {
                    minor = 0;
                    major += 1;
                }
            }
            IncrementPolicy::MinorOnly => {
                minor += 1;
                patch = 0;
            }
        }

        Version {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^v?(\d+)\.(\d+)\.(\d+)$").expect("tag pattern is a valid regex")
    })
}

impl FromStr for Version {
    type Err = BotError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| BotError::MalformedTag {
            tag: tag.to_string(),
            reason: reason.to_string(),
        };

        let caps = tag_pattern()
            .captures(tag.trim())
            .ok_or_else(|| malformed("expected vMAJOR.MINOR.PATCH"))?;

        let component = |i: usize| -> Result<u64, BotError> {
            caps[i]
                .parse::<u64>()
                .map_err(|e| malformed(&e.to_string()))
        };

        Ok(Version {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
        })
    }
}

/// Derives the next release tag from the existing ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionResolver {
    policy: IncrementPolicy,
}

impl VersionResolver {
    pub fn new(policy: IncrementPolicy) -> Self {
        Self { policy }
    }

    /// `tags` is in platform order; only the first entry is consulted.
    pub fn next_tag<S: AsRef<str>>(&self, tags: &[S]) -> Result<String, BotError> {
        self.next_tag_at(tags, 0)
    }

    /// Like `next_tag` but treats `tags[index]` as the present release.
    /// No tag at `index` means there is nothing to bump from.
    pub fn next_tag_at<S: AsRef<str>>(&self, tags: &[S], index: usize) -> Result<String, BotError> {
        match tags.get(index) {
            None => Ok(SEED_TAG.to_string()),
            Some(latest) => {
                let current: Version = latest.as_ref().parse()?;
                Ok(current.bump(self.policy).to_string())
            }
        }
    }
}
