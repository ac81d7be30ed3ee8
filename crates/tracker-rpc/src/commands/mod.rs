pub mod issue;
pub mod project;
pub mod report;
pub mod rpc;
pub mod user;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use tracker_core::{CallContext, Tracker, TrackerClient};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Everything a command needs to reach the configured tracker
pub struct Session<'a> {
    pub client: &'a dyn TrackerClient,
    pub tracker: &'a Tracker,
    pub ctx: &'a CallContext,
}

/// Parse a `YYYY-MM-DD` day to unix seconds at midnight UTC; `None` is today.
pub fn parse_day(day: Option<&str>) -> Result<i64> {
    let date = match day {
        Some(day) => NaiveDate::parse_from_str(day, DATE_FORMAT)
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", day))?,
        None => Utc::now().date_naive(),
    };
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_day_is_midnight_utc() {
        assert_eq!(parse_day(Some("2017-03-14")).unwrap(), 1_489_449_600);
    }

    #[test]
    fn parse_day_rejects_other_formats() {
        let err = parse_day(Some("14.03.2017")).unwrap_err();
        assert!(err.to_string().contains("expected YYYY-MM-DD"));
    }

    #[test]
    fn parse_day_defaults_to_today() {
        let today = parse_day(None).unwrap();
        assert_eq!(today % 86_400, 0);
        assert!(Utc::now().timestamp() - today < 86_400);
    }
}
