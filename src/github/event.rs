use std::path::Path;

use crate::error::BotError;

use super::types::PullRequestEvent;

/// Picks the raw event payload: an inline value wins over the event file.
pub fn load_payload(inline: Option<&str>, path: Option<&Path>) -> Result<String, BotError> {
    if let Some(payload) = inline.filter(|p| !p.trim().is_empty()) {
        return Ok(payload.to_string());
    }

    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            BotError::EventParse(format!("reading event file {}: {}", path.display(), e))
        }),
        None => Err(BotError::EventParse("no payload found for event".to_string())),
    }
}

pub fn parse_pull_request_event(payload: &str) -> Result<PullRequestEvent, BotError> {
    if payload.trim().is_empty() {
        return Err(BotError::EventParse("no payload found for event".to_string()));
    }

    serde_json::from_str(payload).map_err(|e| BotError::EventParse(e.to_string()))
}
