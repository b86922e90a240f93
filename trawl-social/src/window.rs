//! Date windows for the recent-search API.
//!
//! The API takes RFC 3339 `start_time`/`end_time` bounds but users think in
//! days, so the CLI accepts `YYYY-MM-DD` pairs or `--last-days N` and this
//! module turns them into a validated [`DateWindow`].

use time::format_description::well_known::Rfc3339;
use time::{Date, Duration, Month, OffsetDateTime};
use trawl_common::{TrawlError, check_range};

/// How far back the recent-search endpoint reliably serves results.
const ARCHIVE_DAYS: i64 = 7;

/// Slack subtracted from "now" so `end_time` never lands in the future,
/// which the API rejects.
const END_SLACK_SECS: i64 = 20;

/// Parse a strict `YYYY-MM-DD` day.
pub fn parse_day(s: &str) -> Result<Date, TrawlError> {
    let parts: Vec<&str> = s.split('-').collect();
    let parsed = (|| {
        if parts.len() != 3 || parts[0].len() != 4 || parts[1].len() != 2 || parts[2].len() != 2 {
            return None;
        }
        let year: i32 = parts[0].parse().ok()?;
        let month: u8 = parts[1].parse().ok()?;
        let day: u8 = parts[2].parse().ok()?;
        Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
    })();
    parsed.ok_or_else(|| TrawlError::InvalidDate(s.to_string()))
}

/// An inclusive day range expanded to whole-day API bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Date,
    pub end: Date,
}

impl DateWindow {
    /// Resolve the three date flags into at most one window.
    ///
    /// `--last-days` cannot be combined with explicit dates; an end date
    /// without a start date has no meaning either.
    pub fn resolve(
        start: Option<Date>,
        end: Option<Date>,
        last_days: Option<i64>,
    ) -> Result<Option<Self>, TrawlError> {
        if last_days.is_some() && (start.is_some() || end.is_some()) {
            return Err(TrawlError::InvalidArg(
                "--last-days cannot be combined with --start-date/--end-date".into(),
            ));
        }
        match last_days {
            Some(n) => Ok(Some(Self::last_days(n)?)),
            None => Self::from_dates(start, end),
        }
    }

    /// Build a window from explicit dates; the end defaults to today.
    pub fn from_dates(start: Option<Date>, end: Option<Date>) -> Result<Option<Self>, TrawlError> {
        let start = match (start, end) {
            (None, None) => return Ok(None),
            (None, Some(_)) => {
                return Err(TrawlError::InvalidArg(
                    "--end-date requires --start-date".into(),
                ));
            }
            (Some(s), _) => s,
        };
        let end = match end {
            Some(e) => e,
            None => {
                let today = today_utc();
                tracing::info!(end=%format_day(today), "window.end_defaulted_to_today");
                today
            }
        };
        if start >= end {
            return Err(TrawlError::InvalidArg(
                "--start-date must be before --end-date".into(),
            ));
        }
        let window = Self { start, end };
        window.warn_if_beyond_archive();
        Ok(Some(window))
    }

    /// The last `n` days, ending today. `n` is capped at the archive depth.
    pub fn last_days(n: i64) -> Result<Self, TrawlError> {
        check_range("last-days", n, 1, ARCHIVE_DAYS)?;
        let end = today_utc();
        Ok(Self {
            start: end - Duration::days(n),
            end,
        })
    }

    /// Days between the window start and today.
    pub fn lookback_days(&self) -> i64 {
        (today_utc() - self.start).whole_days()
    }

    /// `start_time` parameter: midnight at the start of the first day.
    pub fn start_param(&self) -> String {
        format!("{}T00:00:00Z", format_day(self.start))
    }

    /// `end_time` parameter: the last second of the final day, clamped
    /// behind "now" when the day is still running.
    pub fn end_param(&self) -> String {
        let end_of_day = self
            .end
            .with_hms(23, 59, 59)
            .expect("valid end-of-day time")
            .assume_utc();
        let latest = OffsetDateTime::now_utc() - Duration::seconds(END_SLACK_SECS);
        let latest = latest.replace_nanosecond(0).expect("zero nanosecond");
        end_of_day.min(latest).format(&Rfc3339).unwrap()
    }

    fn warn_if_beyond_archive(&self) {
        let days_back = self.lookback_days();
        if days_back > ARCHIVE_DAYS {
            tracing::warn!(
                days_back,
                archive_days = ARCHIVE_DAYS,
                "window.lookback_exceeds_archive"
            );
        }
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", format_day(self.start), format_day(self.end))
    }
}

fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

fn format_day(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> Date {
        parse_day(s).unwrap()
    }

    #[test]
    fn parse_day_is_strict() {
        assert_eq!(
            day("2025-06-01"),
            Date::from_calendar_date(2025, Month::June, 1).unwrap()
        );
        for bad in ["2025-6-1", "01-06-2025", "2025/06/01", "2025-13-01", "nope", ""] {
            assert!(parse_day(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn explicit_dates_must_be_ordered() {
        let err = DateWindow::from_dates(Some(day("2025-06-10")), Some(day("2025-06-01")))
            .unwrap_err();
        assert!(err.to_string().contains("before"));

        let w = DateWindow::from_dates(Some(day("2025-06-01")), Some(day("2025-06-10")))
            .unwrap()
            .unwrap();
        assert_eq!(w.start_param(), "2025-06-01T00:00:00Z");
        assert_eq!(w.end_param(), "2025-06-10T23:59:59Z");
    }

    #[test]
    fn end_date_alone_is_rejected() {
        assert!(DateWindow::from_dates(None, Some(day("2025-06-10"))).is_err());
        assert!(DateWindow::from_dates(None, None).unwrap().is_none());
    }

    #[test]
    fn end_defaults_to_today_and_is_clamped() {
        let w = DateWindow::from_dates(Some(day("2020-01-01")), None)
            .unwrap()
            .unwrap();
        assert_eq!(w.end, today_utc());
        // Today's 23:59:59 is still ahead of us, so the param must be the
        // clamped "now minus slack" instead.
        let end = w.end_param();
        let parsed = OffsetDateTime::parse(&end, &Rfc3339).unwrap();
        assert!(parsed <= OffsetDateTime::now_utc());
    }

    #[test]
    fn last_days_is_ranged() {
        assert!(DateWindow::last_days(0).is_err());
        assert!(DateWindow::last_days(8).is_err());
        let w = DateWindow::last_days(3).unwrap();
        assert_eq!(w.end, today_utc());
        assert_eq!((w.end - w.start).whole_days(), 3);
    }

    #[test]
    fn resolve_rejects_mixed_flags() {
        let err = DateWindow::resolve(Some(day("2025-06-01")), None, Some(3)).unwrap_err();
        assert!(err.to_string().contains("--last-days"));
        assert!(DateWindow::resolve(None, None, None).unwrap().is_none());
        assert!(DateWindow::resolve(None, None, Some(2)).unwrap().is_some());
    }
}
