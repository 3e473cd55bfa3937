use std::{
    env, fs,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

const DEFAULT_FEATURE_TYPE: &str = "Sviluppo";
const DEFAULT_BUG_TYPE: &str = "Bug";
const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Report-shaping settings: what to query and how to bucket the output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportConfig {
    pub project: Option<String>,
    pub status: Option<String>,
    pub feature_type: String,
    pub bug_type: String,
    pub window_days: u32,
    /// Optional application allow-list. When present, only these labels get
    /// their own report section; when absent, every observed label does.
    pub applications: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShiplogConfig {
    pub jira_server: Option<String>,
    pub jira_user: Option<String>,
    pub jira_password: Option<String>,
    pub api_version: Option<String>,
    pub auth_method: Option<String>,
    pub insecure: bool,
    pub report: ReportConfig,
}

#[derive(Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    general: RawGeneral,
    #[serde(default)]
    report: RawReport,
    jira_server: Option<String>,
    jira_user: Option<String>,
    jira_password: Option<String>,
    api_version: Option<String>,
    auth_method: Option<String>,
    insecure: Option<bool>,
}

#[derive(Default, Deserialize)]
struct RawGeneral {
    jira_server: Option<String>,
    jira_user: Option<String>,
    jira_password: Option<String>,
    api_version: Option<String>,
    auth_method: Option<String>,
    insecure: Option<bool>,
}

#[derive(Default, Deserialize)]
struct RawReport {
    project: Option<String>,
    status: Option<String>,
    feature_type: Option<String>,
    bug_type: Option<String>,
    window_days: Option<u32>,
    applications: Option<Vec<String>>,
}

impl ShiplogConfig {
    pub fn load_default() -> Result<Self> {
        Self::load_from_path(&default_config_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let payload = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let raw: RawConfig =
            serde_yaml::from_str(&payload).with_context(|| "invalid YAML config format")?;
        Ok(Self::from_raw(raw))
    }

    pub fn api_version(&self) -> &str {
        match self.api_version.as_deref() {
            Some("3") => "3",
            _ => "2",
        }
    }

    pub fn auth_method(&self) -> &str {
        if let Some(value) = self.auth_method.as_deref() {
            let normalized = value.trim().to_ascii_lowercase();
            if normalized == "basic" || normalized == "bearer" {
                return if normalized == "basic" {
                    "basic"
                } else {
                    "bearer"
                };
            }
        }

        if self.api_version() == "3" {
            "basic"
        } else {
            "bearer"
        }
    }

    pub fn issue_url(&self, key: &str) -> Result<String> {
        let server = self
            .jira_server
            .as_deref()
            .ok_or_else(|| anyhow!("jira_server not configured"))?;
        Ok(format!("{server}/browse/{key}"))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let jira_server =
            first_some(raw.general.jira_server, raw.jira_server).and_then(normalize_jira_server);
        let jira_user = first_some(raw.general.jira_user, raw.jira_user).and_then(non_empty);
        let jira_password = first_some(raw.general.jira_password, raw.jira_password)
            .and_then(resolve_jira_password);
        let api_version = first_some(raw.general.api_version, raw.api_version).and_then(non_empty);
        let auth_method = first_some(raw.general.auth_method, raw.auth_method).and_then(non_empty);
        let insecure = raw.general.insecure.or(raw.insecure).unwrap_or(false);

        Self {
            jira_server,
            jira_user,
            jira_password,
            api_version,
            auth_method,
            insecure,
            report: ReportConfig::from_raw(raw.report),
        }
    }
}

impl ReportConfig {
    fn from_raw(raw: RawReport) -> Self {
        let applications = raw.applications.map(|entries| {
            entries
                .into_iter()
                .filter_map(non_empty)
                .collect::<Vec<_>>()
        });

        Self {
            project: raw.project.and_then(non_empty),
            status: raw.status.and_then(non_empty),
            feature_type: raw
                .feature_type
                .and_then(non_empty)
                .unwrap_or_else(|| DEFAULT_FEATURE_TYPE.to_string()),
            bug_type: raw
                .bug_type
                .and_then(non_empty)
                .unwrap_or_else(|| DEFAULT_BUG_TYPE.to_string()),
            window_days: raw.window_days.unwrap_or(DEFAULT_WINDOW_DAYS),
            // An empty allow-list means "no restriction", not "drop everything".
            applications: applications.filter(|entries| !entries.is_empty()),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(override_path) = env::var_os("SHIPLOG_CONFIG_FILE") {
        return PathBuf::from(override_path);
    }

    let mut base = env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    base.push(".config");
    base.push("shiplog");
    base.push("config.yaml");
    base
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn normalize_jira_server(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Some(trimmed.trim_end_matches('/').to_string())
    } else {
        Some(format!("https://{}", trimmed.trim_end_matches('/')))
    }
}

fn first_some<T>(first: Option<T>, second: Option<T>) -> Option<T> {
    first.or(second)
}

fn resolve_jira_password(value: String) -> Option<String> {
    resolve_jira_password_with(value, fetch_secret_from_manager)
}

fn resolve_jira_password_with<F>(value: String, fetch: F) -> Option<String>
where
    F: Fn(&str, &str) -> Option<String>,
{
    let password = non_empty(value)?;
    let Some((provider, key)) = parse_secret_reference(password.as_str()) else {
        return Some(password);
    };
    fetch(provider, key)
}

fn parse_secret_reference(value: &str) -> Option<(&str, &str)> {
    let (provider, key) = value.split_once("::")?;
    if key.trim().is_empty() {
        return None;
    }
    if provider == "pass" || provider == "passage" {
        Some((provider, key.trim()))
    } else {
        None
    }
}

fn fetch_secret_from_manager(provider: &str, key: &str) -> Option<String> {
    let output = Command::new(provider).arg("show").arg(key).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    non_empty(stdout.trim().to_string())
}
