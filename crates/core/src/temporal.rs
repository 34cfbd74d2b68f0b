//! Day boundaries, end-time resolution, and overlap detection
//!
//! The local calendar date comes from the configured timezone, but the
//! instant that date *starts* is computed with a fixed UTC offset
//! ([`LOCAL_MIDNIGHT_UTC_OFFSET_HOURS`]). During the half of the year when
//! the real offset differs, the day boundary lands an hour off true local
//! midnight. Records written near midnight stay on a consistent side of the
//! boundary either way, so the simplification is kept.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::America::New_York;
use daybook_domain::constants::LOCAL_MIDNIGHT_UTC_OFFSET_HOURS;
use daybook_domain::Activity;

use crate::clock::Clock;

/// How an activity's end instant was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingMode {
    /// The message named a clock time ("until 3pm").
    Explicit,
    /// Chained onto the previous activity ("then 30min reading").
    AfterPrevious,
    /// No timing cue; the activity ends now.
    Now,
}

/// An activity end instant plus the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEnd {
    pub end: DateTime<Utc>,
    pub mode: TimingMode,
}

/// Clock-aware calendar math shared by every handler.
#[derive(Clone)]
pub struct TemporalResolver {
    clock: Arc<dyn Clock>,
}

impl TemporalResolver {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Current instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Today's calendar date in the local timezone.
    pub fn local_date(&self) -> NaiveDate {
        self.clock.now().with_timezone(&New_York).date_naive()
    }

    /// Local weekday name ("Tuesday"), used in the classifier prompt.
    pub fn day_name(&self) -> String {
        self.clock.now().with_timezone(&New_York).format("%A").to_string()
    }

    /// Instant a local wall-clock time falls on, for the given local date.
    ///
    /// Uses the fixed UTC offset rather than the timezone database, matching
    /// [`Self::start_of_day`].
    pub fn instant_on(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        date.and_time(time).and_utc() + Duration::hours(LOCAL_MIDNIGHT_UTC_OFFSET_HOURS)
    }

    /// Instant the given local date begins.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.instant_on(date, NaiveTime::MIN)
    }

    /// Instant today began. Every "today" query filters against this.
    pub fn start_of_today(&self) -> DateTime<Utc> {
        self.start_of_day(self.local_date())
    }

    /// The coming Sunday, exclusive of today: on a Sunday this is the *next*
    /// Sunday, so "this week" always reaches forward.
    pub fn end_of_week(&self) -> NaiveDate {
        let today = self.local_date();
        let days_ahead = 7 - i64::from(today.weekday().num_days_from_sunday());
        today + Duration::days(days_ahead)
    }

    /// Pick the end instant for a new activity.
    ///
    /// An explicit end time always wins. Otherwise a "then ..." message
    /// chains onto the end of `last_today`; with nothing to chain onto, or no
    /// timing cue at all, the activity ends now.
    pub fn resolve_end(
        &self,
        duration_minutes: i64,
        end_time: Option<NaiveTime>,
        relative_to_last: bool,
        last_today: Option<&Activity>,
    ) -> ResolvedEnd {
        if let Some(time) = end_time {
            return ResolvedEnd {
                end: self.instant_on(self.local_date(), time),
                mode: TimingMode::Explicit,
            };
        }
        if relative_to_last {
            if let Some(last) = last_today {
                return ResolvedEnd {
                    end: last.end_time() + Duration::minutes(duration_minutes),
                    mode: TimingMode::AfterPrevious,
                };
            }
        }
        ResolvedEnd { end: self.clock.now(), mode: TimingMode::Now }
    }
}

/// First existing activity that strictly overlaps a candidate ending at
/// `new_end` and running `duration_minutes` back from it.
///
/// Overlap is strict on both sides, so back-to-back activities sharing an
/// endpoint do not conflict.
pub fn find_overlap(
    new_end: DateTime<Utc>,
    duration_minutes: i64,
    existing: &[Activity],
) -> Option<&Activity> {
    let new_start = new_end - Duration::minutes(duration_minutes);
    existing
        .iter()
        .find(|a| new_start < a.end_time() && new_end > a.start_time())
}
