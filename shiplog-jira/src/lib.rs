pub mod resolve;

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use shiplog_config::ShiplogConfig;
use shiplog_domain::{Issue, ParentRef};

const REQUEST_TIMEOUT_SECS: u64 = 30;

// Every fetch asks for the same field set; the report needs nothing else.
const ISSUE_FIELDS: &[&str] = &["summary", "description", "issuetype", "labels", "parent"];

#[derive(Clone, Debug, PartialEq, Eq)]
enum AuthMode {
    Basic { user: String, password: String },
    Bearer { token: String },
}

pub struct JiraClient {
    api_version: String,
    base_url: String,
    http: Client,
    auth_mode: AuthMode,
}

#[derive(Deserialize)]
struct SearchPayload {
    #[serde(default)]
    issues: Vec<IssuePayload>,
    #[serde(default)]
    total: usize,
}

#[derive(Deserialize)]
struct IssuePayload {
    key: String,
    #[serde(default)]
    fields: IssueFields,
}

#[derive(Default, Deserialize)]
struct IssueFields {
    summary: Option<String>,
    issuetype: Option<NameLike>,
    #[serde(default)]
    labels: Vec<String>,
    description: Option<Value>,
    parent: Option<ParentPayload>,
}

// Search results embed the parent with a reduced field set. Only the key is
// reliable; summary and issuetype may be missing.
#[derive(Deserialize)]
struct ParentPayload {
    key: String,
    #[serde(default)]
    fields: ParentFields,
}

#[derive(Default, Deserialize)]
struct ParentFields {
    summary: Option<String>,
    issuetype: Option<NameLike>,
}

#[derive(Default, Deserialize)]
struct NameLike {
    name: Option<String>,
}

impl JiraClient {
    pub fn from_config(config: &ShiplogConfig) -> Result<Self> {
        let server = config
            .jira_server
            .as_deref()
            .ok_or_else(|| anyhow!("jira_server not configured"))?;
        let api_version = config.api_version().to_string();
        let auth_mode = parse_auth_mode(config)?;

        let http = Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .with_context(|| "failed to build Jira HTTP client")?;

        Ok(Self {
            api_version: api_version.clone(),
            base_url: format!("{server}/rest/api/{api_version}"),
            http,
            auth_mode,
        })
    }

    /// Run a search and materialize every matching issue before returning.
    pub fn search_issues_all(&self, jql: &str, page_size: usize) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();
        let mut start_at = 0usize;

        loop {
            let page = self.search_issues_page(jql, start_at, page_size)?;
            let page_len = page.issues.len();
            issues.extend(page.issues.into_iter().map(into_issue));

            if page_len == 0 || start_at + page_size >= page.total {
                break;
            }
            start_at += page_size;
        }

        Ok(issues)
    }

    /// Point lookup used when a search result's parent link must be upgraded
    /// to the full record. A key the tracker cannot return is an error.
    pub fn get_issue(&self, key: &str) -> Result<Issue> {
        let endpoint = format!("{}/issue/{}", self.base_url, key);
        let response = self
            .with_auth(self.http.get(endpoint))
            .query(&[("fields", ISSUE_FIELDS.join(","))])
            .send()
            .with_context(|| format!("failed to fetch issue {}", key))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            bail!(
                "jira issue request for {} failed: status={} body={}",
                key,
                status,
                body
            );
        }

        let payload: IssuePayload = response
            .json()
            .with_context(|| format!("failed to decode Jira issue response for {}", key))?;
        Ok(into_issue(payload))
    }

    fn search_issues_page(
        &self,
        jql: &str,
        start_at: usize,
        page_size: usize,
    ) -> Result<SearchPayload> {
        let endpoint = format!("{}/{}", self.base_url, self.search_endpoint());
        let response = self
            .with_auth(self.http.get(endpoint))
            .query(&[
                ("jql", jql.to_string()),
                ("startAt", start_at.to_string()),
                ("maxResults", page_size.to_string()),
                ("fields", ISSUE_FIELDS.join(",")),
            ])
            .send()
            .with_context(|| "failed to execute Jira search request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            bail!(
                "jira search request failed: status={} body={}",
                status,
                body
            );
        }

        response
            .json()
            .with_context(|| "failed to decode Jira search response")
    }

    fn search_endpoint(&self) -> &str {
        if self.api_version == "3" {
            "search/jql"
        } else {
            "search"
        }
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_mode {
            AuthMode::Basic { user, password } => request.basic_auth(user, Some(password)),
            AuthMode::Bearer { token } => request.bearer_auth(token),
        }
    }
}

impl resolve::IssueLookup for JiraClient {
    fn issue_by_key(&self, key: &str) -> Result<Issue> {
        self.get_issue(key)
    }
}

fn parse_auth_mode(config: &ShiplogConfig) -> Result<AuthMode> {
    let secret = config
        .jira_password
        .as_deref()
        .ok_or_else(|| anyhow!("jira_password not configured"))?;

    match config.auth_method() {
        "basic" => {
            let user = config
                .jira_user
                .as_deref()
                .ok_or_else(|| anyhow!("jira_user not configured for basic auth"))?;
            Ok(AuthMode::Basic {
                user: user.to_string(),
                password: secret.to_string(),
            })
        }
        "bearer" => Ok(AuthMode::Bearer {
            token: secret.to_string(),
        }),
        other => bail!("unsupported auth method '{}'", other),
    }
}

fn into_issue(payload: IssuePayload) -> Issue {
    let fields = payload.fields;
    Issue {
        key: payload.key,
        summary: fields.summary.and_then(non_empty),
        description: normalize_description(fields.description),
        issue_type: fields.issuetype.and_then(name_like),
        labels: fields
            .labels
            .into_iter()
            .filter_map(non_empty)
            .collect::<Vec<_>>(),
        parent: fields.parent.map(into_parent_ref),
    }
}

fn into_parent_ref(payload: ParentPayload) -> ParentRef {
    ParentRef {
        key: payload.key,
        summary: payload.fields.summary.and_then(non_empty),
        issue_type: payload.fields.issuetype.and_then(name_like),
    }
}

fn name_like(value: NameLike) -> Option<String> {
    value.name.and_then(non_empty)
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn normalize_description(value: Option<Value>) -> String {
    let Some(payload) = value else {
        return String::new();
    };

    // API v2 sends plain text; API v3 sends an ADF document tree.
    if let Some(text) = payload.as_str() {
        return text.to_string();
    }

    let is_doc = payload
        .get("type")
        .and_then(Value::as_str)
        .map(|value| value == "doc")
        .unwrap_or(false);

    if !is_doc {
        return String::new();
    }

    let mut out = String::new();
    extract_adf_text(&payload, &mut out);
    out.trim().to_string()
}

fn extract_adf_text(node: &Value, out: &mut String) {
    if let Some(node_type) = node.get("type").and_then(Value::as_str) {
        match node_type {
            "text" => {
                if let Some(text) = node.get("text").and_then(Value::as_str) {
                    out.push_str(text);
                }
            }
            "hardBreak" => out.push('\n'),
            "paragraph" | "heading" | "blockquote" | "listItem" => {
                if let Some(children) = node.get("content").and_then(Value::as_array) {
                    for child in children {
                        extract_adf_text(child, out);
                    }
                }
                out.push('\n');
            }
            _ => {
                if let Some(children) = node.get("content").and_then(Value::as_array) {
                    for child in children {
                        extract_adf_text(child, out);
                    }
                }
            }
        }
        return;
    }

    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children {
            extract_adf_text(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{into_issue, normalize_description, IssuePayload, JiraClient};

    #[test]
    fn chooses_correct_search_endpoint_for_api_versions() {
        let client_2 = JiraClient {
            api_version: "2".to_string(),
            base_url: "https://jira.example.com/rest/api/2".to_string(),
            http: reqwest::blocking::Client::new(),
            auth_mode: super::AuthMode::Bearer {
                token: "x".to_string(),
            },
        };
        let client_3 = JiraClient {
            api_version: "3".to_string(),
            base_url: "https://jira.example.com/rest/api/3".to_string(),
            http: reqwest::blocking::Client::new(),
            auth_mode: super::AuthMode::Bearer {
                token: "x".to_string(),
            },
        };

        assert_eq!(client_2.search_endpoint(), "search");
        assert_eq!(client_3.search_endpoint(), "search/jql");
    }

    #[test]
    fn maps_issue_payload_with_embedded_parent() {
        let payload: IssuePayload = serde_json::from_value(json!({
            "key": "DEMO-7",
            "fields": {
                "summary": " Fix login ",
                "issuetype": {"name": "Bug"},
                "labels": ["app1", "  "],
                "description": "plain text",
                "parent": {
                    "key": "DEMO-2",
                    "fields": {
                        "summary": "Checkout epic",
                        "issuetype": {"name": "Epic"}
                    }
                }
            }
        }))
        .expect("payload");

        let issue = into_issue(payload);
        assert_eq!(issue.key, "DEMO-7");
        assert_eq!(issue.summary.as_deref(), Some("Fix login"));
        assert_eq!(issue.issue_type.as_deref(), Some("Bug"));
        assert_eq!(issue.labels, vec!["app1".to_string()]);
        assert_eq!(issue.description, "plain text");

        let parent = issue.parent.expect("parent");
        assert_eq!(parent.key, "DEMO-2");
        assert_eq!(parent.summary.as_deref(), Some("Checkout epic"));
        assert_eq!(parent.issue_type.as_deref(), Some("Epic"));
    }

    #[test]
    fn maps_issue_payload_without_optional_fields() {
        let payload: IssuePayload = serde_json::from_value(json!({
            "key": "DEMO-8",
            "fields": {}
        }))
        .expect("payload");

        let issue = into_issue(payload);
        assert_eq!(issue.summary, None);
        assert_eq!(issue.issue_type, None);
        assert!(issue.labels.is_empty());
        assert_eq!(issue.description, "");
        assert!(issue.parent.is_none());
    }

    #[test]
    fn partially_populated_parent_keeps_only_the_key() {
        let payload: IssuePayload = serde_json::from_value(json!({
            "key": "DEMO-9",
            "fields": {
                "parent": {"key": "DEMO-3"}
            }
        }))
        .expect("payload");

        let parent = into_issue(payload).parent.expect("parent");
        assert_eq!(parent.key, "DEMO-3");
        assert_eq!(parent.summary, None);
        assert_eq!(parent.issue_type, None);
    }

    #[test]
    fn flattens_adf_description() {
        let doc = json!({
            "type": "doc",
            "content": [
                {
                    "type": "paragraph",
                    "content": [{"type": "text", "text": "Hello"}]
                },
                {
                    "type": "paragraph",
                    "content": [{"type": "text", "text": "World"}]
                }
            ]
        });

        assert_eq!(normalize_description(Some(doc)), "Hello\nWorld");
    }
}
