use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use shiplog_config::ReportConfig;

/// How many days back the search window reaches: the distance from the
/// requested start date to today, or the configured default when no start
/// date was given.
pub fn window_days(
    start_date: Option<NaiveDate>,
    today: NaiveDate,
    default_days: u32,
) -> Result<i64> {
    let Some(start) = start_date else {
        return Ok(i64::from(default_days));
    };

    let days = (today - start).num_days();
    if days < 0 {
        bail!("start date {start} is in the future");
    }
    Ok(days)
}

pub fn build_jql(report: &ReportConfig, window_days: i64) -> Result<String> {
    let project = report
        .project
        .as_deref()
        .ok_or_else(|| anyhow!("report.project not configured"))?;
    let status = report
        .status
        .as_deref()
        .ok_or_else(|| anyhow!("report.status not configured"))?;

    Ok(format!(
        "project IN ({project}) AND status = \"{status}\" AND type IN (\"{}\", \"{}\") AND updated >= -{window_days}d",
        report.feature_type, report.bug_type
    ))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use shiplog_config::ReportConfig;

    use super::{build_jql, window_days};

    fn report_config() -> ReportConfig {
        ReportConfig {
            project: Some("DEMO".to_string()),
            status: Some("Collaudo".to_string()),
            feature_type: "Sviluppo".to_string(),
            bug_type: "Bug".to_string(),
            window_days: 30,
            applications: None,
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("date")
    }

    #[test]
    fn window_defaults_when_no_start_date() {
        let days = window_days(None, date(2026, 8, 5), 30).expect("days");
        assert_eq!(days, 30);
    }

    #[test]
    fn window_measures_distance_to_today() {
        let days =
            window_days(Some(date(2026, 7, 26)), date(2026, 8, 5), 30).expect("days");
        assert_eq!(days, 10);
    }

    #[test]
    fn future_start_date_is_rejected() {
        let error = window_days(Some(date(2026, 8, 6)), date(2026, 8, 5), 30)
            .expect_err("expected error");
        assert!(error.to_string().contains("future"));
    }

    #[test]
    fn builds_the_search_filter() {
        let jql = build_jql(&report_config(), 14).expect("jql");
        assert_eq!(
            jql,
            "project IN (DEMO) AND status = \"Collaudo\" AND type IN (\"Sviluppo\", \"Bug\") AND updated >= -14d"
        );
    }

    #[test]
    fn missing_project_is_an_error() {
        let mut config = report_config();
        config.project = None;
        let error = build_jql(&config, 30).expect_err("expected error");
        assert!(error.to_string().contains("report.project"));
    }

    #[test]
    fn missing_status_is_an_error() {
        let mut config = report_config();
        config.status = None;
        let error = build_jql(&config, 30).expect_err("expected error");
        assert!(error.to_string().contains("report.status"));
    }
}
