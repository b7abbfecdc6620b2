//! Message selection policies
//!
//! One policy is picked per deployment. All of them return an absent
//! result instead of raising when nothing matches, and the pipeline
//! short-circuits on absent results uniformly.

use std::str::FromStr;

use anyhow::Result;

use super::MessageStore;
use super::dedup::DedupStore;
use super::extract::message_subject;
use crate::google::gmail::Message;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolvePolicy {
    /// The single most recent message in the mailbox, deduplicated
    /// (first sighting wins).
    MostRecent,
    /// Messages added since the notification's history cursor, filtered
    /// by subject tag, deduplicated.
    HistoryTag,
    /// Same as `HistoryTag` without dedup.
    HistoryTagAll,
}

impl FromStr for ResolvePolicy {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "most-recent" => Ok(Self::MostRecent),
            "history-tag" => Ok(Self::HistoryTag),
            "history-tag-all" => Ok(Self::HistoryTagAll),
            other => anyhow::bail!("Unknown resolve policy: {}", other),
        }
    }
}

/// Outcome of message selection. The absent variants are not errors.
#[derive(Debug)]
pub enum Resolution {
    Selected(Box<Message>),
    Duplicate(String),
    None,
}

/// Find the candidate message for a notification under the configured
/// policy. Tie-break within the history policies is "first matching
/// subject in returned list"; uniqueness is not guaranteed by the store.
pub async fn resolve(
    store: &dyn MessageStore,
    dedup: &dyn DedupStore,
    policy: ResolvePolicy,
    subject_tag: Option<&str>,
    history_id: &str,
) -> Result<Resolution> {
    match policy {
        ResolvePolicy::MostRecent => {
            let Some(candidate) = store.list_most_recent().await? else {
                return Ok(Resolution::None);
            };
            if !dedup.first_seen(&candidate.id).await? {
                return Ok(Resolution::Duplicate(candidate.id));
            }
            let message = store.get_message(&candidate.id).await?;
            Ok(Resolution::Selected(Box::new(message)))
        }
        ResolvePolicy::HistoryTag | ResolvePolicy::HistoryTagAll => {
            // An empty history is a valid "nothing new" answer
            let candidates = store.list_history(history_id).await?;
            for candidate in candidates {
                let message = store.get_message(&candidate.id).await?;
                let matches = match subject_tag {
                    Some(tag) => message_subject(&message).is_some_and(|s| s.contains(tag)),
                    // No tag configured means every candidate matches
                    None => true,
                };
                if !matches {
                    continue;
                }
                if policy == ResolvePolicy::HistoryTag && !dedup.first_seen(&message.id).await? {
                    return Ok(Resolution::Duplicate(message.id));
                }
                return Ok(Resolution::Selected(Box::new(message)));
            }
            Ok(Resolution::None)
        }
    }
}
