//! The reference window a categorization pass is evaluated against.

use chrono::{DateTime, Days, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// One of the six mutually exclusive due buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DueBucket {
    Overdue,
    Today,
    Tomorrow,
    #[strum(to_string = "This Week")]
    ThisWeek,
    Later,
    Unscheduled,
}

/// Reference points derived once from a captured `now`.
///
/// Calendar dates are read in `now`'s time zone. `+1 day` and `+7 days` are
/// calendar additions that keep the wall-clock time.
#[derive(Debug, Clone)]
pub struct ReviewWindow<Tz: TimeZone> {
    tz: Tz,
    now: DateTime<Utc>,
    today: NaiveDate,
    tomorrow: NaiveDate,
    tomorrow_at: DateTime<Utc>,
    week_end: DateTime<Utc>,
}

impl<Tz: TimeZone> ReviewWindow<Tz> {
    /// Capture the window for one categorization pass.
    pub fn new(now: DateTime<Tz>) -> Self {
        let tomorrow_local = add_days(&now, 1);
        let week_end_local = add_days(&now, 7);

        Self {
            tz: now.timezone(),
            now: now.with_timezone(&Utc),
            today: now.date_naive(),
            tomorrow: tomorrow_local.date_naive(),
            tomorrow_at: tomorrow_local.with_timezone(&Utc),
            week_end: week_end_local.with_timezone(&Utc),
        }
    }

    /// The captured instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Upper bound (inclusive) of the "this week" bucket.
    pub fn week_end(&self) -> DateTime<Utc> {
        self.week_end
    }

    /// Place a single review date.
    ///
    /// Overdue is an instant comparison; today and tomorrow compare calendar
    /// dates. The first matching rule wins, so the buckets never overlap.
    pub fn classify(&self, next_review: Option<&DateTime<Utc>>) -> DueBucket {
        let Some(at) = next_review else {
            return DueBucket::Unscheduled;
        };

        if *at < self.now {
            return DueBucket::Overdue;
        }

        let date = at.with_timezone(&self.tz).date_naive();
        if date == self.today {
            DueBucket::Today
        } else if date == self.tomorrow {
            DueBucket::Tomorrow
        } else if *at > self.tomorrow_at && *at <= self.week_end {
            DueBucket::ThisWeek
        } else {
            DueBucket::Later
        }
    }
}

fn add_days<Tz: TimeZone>(at: &DateTime<Tz>, days: u64) -> DateTime<Tz> {
    at.clone()
        .checked_add_days(Days::new(days))
        .unwrap_or_else(|| at.clone() + Duration::days(days as i64))
}
