use anyhow::{anyhow, Context, Result};
use shiplog_domain::{EpicRef, Issue};

const STORY_TYPE: &str = "Story";

/// Point-lookup capability: upgrade a key to the fully populated record.
pub trait IssueLookup {
    fn issue_by_key(&self, key: &str) -> Result<Issue>;
}

/// Collapse an issue's parent chain into its canonical epic.
///
/// The common case is one level deep: the immediate parent is the epic and
/// its embedded fields are returned as-is, no extra fetch. When the parent is
/// a Story, the embedded value cannot be trusted (search results populate
/// parents only partially), so the story is re-fetched in full and its own
/// parent is fetched as the epic. At most two extra lookups per issue; chains
/// deeper than issue -> story -> epic are a tracker schema assumption.
pub fn resolve_epic(lookup: &impl IssueLookup, issue: &Issue) -> Result<Option<EpicRef>> {
    let Some(parent) = issue.parent.as_ref() else {
        return Ok(None);
    };

    if parent.issue_type.as_deref() != Some(STORY_TYPE) {
        return Ok(Some(EpicRef {
            key: parent.key.clone(),
            name: parent.summary.clone(),
            issue_type: parent.issue_type.clone(),
        }));
    }

    let story = lookup
        .issue_by_key(&parent.key)
        .with_context(|| format!("failed to fetch story {} for {}", parent.key, issue.key))?;

    let epic_key = story
        .parent
        .as_ref()
        .map(|epic| epic.key.clone())
        .ok_or_else(|| anyhow!("story {} has no parent epic", story.key))?;

    let epic = lookup
        .issue_by_key(&epic_key)
        .with_context(|| format!("failed to fetch epic {} for {}", epic_key, issue.key))?;

    Ok(Some(EpicRef {
        key: epic.key,
        name: epic.summary,
        issue_type: epic.issue_type,
    }))
}
