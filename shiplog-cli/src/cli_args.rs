use std::{env, path::PathBuf};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    pub start_date: Option<NaiveDate>,
    pub config_path: Option<PathBuf>,
    pub verbose: bool,
}

#[derive(Debug)]
pub enum CliAction {
    Run(RunOptions),
    Help,
}

pub fn parse_cli_action() -> Result<CliAction> {
    parse_args(env::args().skip(1))
}

pub fn print_help() {
    println!("shiplog - generate a grouped Jira changelog report");
    println!("Usage:");
    println!("  shiplog [--date <YYYY-MM-DD>] [--config <path>] [--verbose]");
    println!("Options:");
    println!("  --date <YYYY-MM-DD>   Report window start (default: configured window back from today)");
    println!("  --config <path>       Config file (default: ~/.config/shiplog/config.yaml)");
    println!("  --verbose, -v         Debug-level logging");
}

fn parse_args<I>(args: I) -> Result<CliAction>
where
    I: IntoIterator<Item = String>,
{
    let mut start_date = None;
    let mut config_path = None;
    let mut verbose = false;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--date" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--date requires a value"))?;
                start_date = Some(
                    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                        .map_err(|_| anyhow!("invalid date '{value}', expected YYYY-MM-DD"))?,
                );
            }
            "--config" => {
                config_path = Some(PathBuf::from(
                    args.next()
                        .ok_or_else(|| anyhow!("--config requires a value"))?,
                ));
            }
            "--verbose" | "-v" => {
                verbose = true;
            }
            "--help" | "-h" => {
                return Ok(CliAction::Help);
            }
            other => return Err(anyhow!("Unknown argument: {other}")),
        }
    }

    Ok(CliAction::Run(RunOptions {
        start_date,
        config_path,
        verbose,
    }))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{parse_args, CliAction};

    #[test]
    fn defaults_when_no_args() {
        let action = parse_args(Vec::<String>::new()).expect("action");
        let CliAction::Run(options) = action else {
            panic!("expected run action");
        };

        assert_eq!(options.start_date, None);
        assert_eq!(options.config_path, None);
        assert!(!options.verbose);
    }

    #[test]
    fn parses_the_start_date() {
        let action =
            parse_args(vec!["--date".to_string(), "2026-07-01".to_string()]).expect("action");
        let CliAction::Run(options) = action else {
            panic!("expected run action");
        };

        assert_eq!(
            options.start_date,
            NaiveDate::from_ymd_opt(2026, 7, 1)
        );
    }

    #[test]
    fn rejects_a_malformed_date() {
        let error = parse_args(vec!["--date".to_string(), "01/07/2026".to_string()])
            .expect_err("expected error");
        assert!(error.to_string().contains("expected YYYY-MM-DD"));
    }

    #[test]
    fn returns_help_action() {
        let action = parse_args(vec!["--help".to_string()]).expect("action");
        assert!(matches!(action, CliAction::Help));
    }

    #[test]
    fn rejects_unknown_arguments() {
        let error =
            parse_args(vec!["--output".to_string()]).expect_err("expected error");
        assert!(error.to_string().contains("Unknown argument"));
    }
}
