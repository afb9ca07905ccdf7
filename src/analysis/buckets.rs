use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A day-part template: a labeled hour window inside one calendar day.
///
/// The four defaults tile the day without gaps or overlap; custom templates
/// come from configuration and are instantiated per calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPart {
    pub start_hour: u32,
    pub end_hour: u32,
    pub label: String,
}

impl DayPart {
    pub fn new(start_hour: u32, end_hour: u32, label: impl Into<String>) -> Self {
        Self {
            start_hour,
            end_hour,
            label: label.into(),
        }
    }

    /// The standard four-part day: [0,6) [6,12) [12,18) [18,24).
    pub fn standard() -> Vec<DayPart> {
        vec![
            DayPart::new(0, 6, "Early Morning"),
            DayPart::new(6, 12, "Morning"),
            DayPart::new(12, 18, "Midday"),
            DayPart::new(18, 24, "Evening"),
        ]
    }
}

/// One concrete forecast window: a day-part instantiated on a calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBucket {
    pub date: NaiveDate,
    pub start_hour: u32,
    pub end_hour: u32,
    pub label: String,
}

impl TimeBucket {
    /// Inclusive start of the window.
    pub fn start(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::MIN) + Duration::hours(self.start_hour as i64)
    }

    /// Exclusive end of the window. An `end_hour` of 24 rolls into the next date.
    pub fn end(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::MIN) + Duration::hours(self.end_hour as i64)
    }

    /// Whether a timestamp falls inside this window.
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start() && ts < self.end()
    }
}

/// Partitions the forecast horizon into upcoming day-part windows.
///
/// A bucket on the current calendar date is dropped once `now` passes its end
/// plus a grace window; buckets that `now` falls inside are kept whole. The
/// grace window decides whether the current bucket disappears exactly on the
/// hour or a few minutes later, so it is configuration rather than a constant.
#[derive(Debug, Clone)]
pub struct TimeBucketer {
    horizon_days: u32,
    grace: Duration,
    day_parts: Vec<DayPart>,
}

impl TimeBucketer {
    pub fn new(horizon_days: u32, grace_minutes: i64, day_parts: Vec<DayPart>) -> Self {
        Self {
            horizon_days,
            grace: Duration::minutes(grace_minutes),
            day_parts,
        }
    }

    /// Generate the ordered list of not-yet-expired buckets relative to `now`.
    ///
    /// `now` is always a parameter, never read from the clock here, so bucket
    /// generation stays deterministic in tests and idempotent per run.
    pub fn upcoming(&self, now: NaiveDateTime) -> Vec<TimeBucket> {
        let mut buckets = Vec::with_capacity(self.horizon_days as usize * self.day_parts.len());

        for day in 0..self.horizon_days {
            let date = now.date() + Duration::days(day as i64);
            for part in &self.day_parts {
                let bucket = TimeBucket {
                    date,
                    start_hour: part.start_hour,
                    end_hour: part.end_hour,
                    label: part.label.clone(),
                };
                // Future dates pass trivially; only today's buckets can expire.
                if now < bucket.end() + self.grace {
                    buckets.push(bucket);
                }
            }
        }

        buckets
    }
}
