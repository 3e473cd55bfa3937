use std::collections::BTreeSet;

use chrono::NaiveDate;
use shiplog_domain::EnrichedIssue;

pub struct ReportContext<'a> {
    pub server: &'a str,
    pub date: NaiveDate,
    pub feature_type: &'a str,
    pub bug_type: &'a str,
    /// Label allow-list; `None` means every observed label gets a section.
    pub applications: Option<&'a [String]>,
}

/// Fold the enriched table into the markdown report. Pure function of its
/// inputs; rendering the same rows for the same date is byte-identical.
pub fn render(rows: &[EnrichedIssue], ctx: &ReportContext) -> String {
    let mut content = format!(
        "# ISSUES IN TEST ENVIRONMENT DATE: {}\n",
        ctx.date.format("%d/%m/%Y")
    );

    for application in application_sections(rows, ctx.applications) {
        let subset: Vec<&EnrichedIssue> = match application.as_deref() {
            Some(label) => rows.iter().filter(|row| row.has_label(label)).collect(),
            None => rows.iter().filter(|row| row.is_unlabeled()).collect(),
        };

        match application.as_deref() {
            Some(label) => content.push_str(&format!("## {label}\n")),
            None => content.push_str("## Application Unknown\n"),
        }

        for epic in epic_sections(&subset) {
            let cell: Vec<&EnrichedIssue> = match &epic {
                Some((key, _)) => subset
                    .iter()
                    .copied()
                    .filter(|row| row.epic_key() == Some(key.as_str()))
                    .collect(),
                None => subset
                    .iter()
                    .copied()
                    .filter(|row| row.epic.is_none())
                    .collect(),
            };

            match &epic {
                Some((key, name)) => content.push_str(&format!(
                    "### [{key}]({}/browse/{key}) {}\n",
                    ctx.server,
                    name.as_deref().unwrap_or_default()
                )),
                None => content.push_str("### Epic Unknown\n"),
            }

            push_bucket(&mut content, "Features", &cell, ctx.feature_type, ctx.server);
            push_bucket(&mut content, "Bugfixes", &cell, ctx.bug_type, ctx.server);
        }
    }

    content
}

/// Ordered application keys: observed labels ascending (restricted to the
/// allow-list when one is configured), with the Unknown bucket last and only
/// when some row carries no labels at all.
fn application_sections(
    rows: &[EnrichedIssue],
    allow_list: Option<&[String]>,
) -> Vec<Option<String>> {
    let mut labels = BTreeSet::new();
    for row in rows {
        for label in &row.issue.labels {
            let allowed = allow_list
                .map(|entries| entries.iter().any(|entry| entry == label))
                .unwrap_or(true);
            if allowed {
                labels.insert(label.clone());
            }
        }
    }

    let mut sections: Vec<Option<String>> = labels.into_iter().map(Some).collect();
    if rows.iter().any(EnrichedIssue::is_unlabeled) {
        sections.push(None);
    }
    sections
}

/// Distinct (epic key, epic name) pairs within one application subset, sorted
/// by key ascending, with the unknown-epic bucket last and only when present.
fn epic_sections(subset: &[&EnrichedIssue]) -> Vec<Option<(String, Option<String>)>> {
    let mut pairs = BTreeSet::new();
    for row in subset {
        if let Some(epic) = &row.epic {
            pairs.insert((epic.key.clone(), epic.name.clone()));
        }
    }

    let mut sections: Vec<Option<(String, Option<String>)>> =
        pairs.into_iter().map(Some).collect();
    if subset.iter().any(|row| row.epic.is_none()) {
        sections.push(None);
    }
    sections
}

fn push_bucket(
    content: &mut String,
    title: &str,
    cell: &[&EnrichedIssue],
    issue_type: &str,
    server: &str,
) {
    let matching: Vec<&EnrichedIssue> = cell
        .iter()
        .copied()
        .filter(|row| row.issue.issue_type.as_deref() == Some(issue_type))
        .collect();
    if matching.is_empty() {
        return;
    }

    content.push_str(&format!("**{title}:**\n"));
    for row in matching {
        content.push_str(&format!(
            "- [{key}]({server}/browse/{key}) {}\n",
            row.issue.summary.as_deref().unwrap_or_default(),
            key = row.issue.key,
        ));
    }
}
