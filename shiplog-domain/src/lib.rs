/// Partially populated parent link as embedded in search results. Only the
/// key is guaranteed; summary and type may be absent until the issue is
/// fetched in full.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentRef {
    pub key: String,
    pub summary: Option<String>,
    pub issue_type: Option<String>,
}

/// Immutable snapshot of a tracker issue, fetched once per run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    pub key: String,
    pub summary: Option<String>,
    pub description: String,
    pub issue_type: Option<String>,
    pub labels: Vec<String>,
    pub parent: Option<ParentRef>,
}

/// Canonical epic reference produced by resolution. An epic is never
/// partially populated: a row either has a full `EpicRef` or none.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpicRef {
    pub key: String,
    pub name: Option<String>,
    pub issue_type: Option<String>,
}

/// An issue together with its resolved epic, ready for report grouping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnrichedIssue {
    pub issue: Issue,
    pub epic: Option<EpicRef>,
}

impl EnrichedIssue {
    pub fn epic_key(&self) -> Option<&str> {
        self.epic.as_ref().map(|epic| epic.key.as_str())
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.issue.labels.iter().any(|value| value == label)
    }

    /// Zero labels routes the row to the Application Unknown bucket.
    pub fn is_unlabeled(&self) -> bool {
        self.issue.labels.is_empty()
    }
}
