use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{Result, WidgetError};

/// Julian day number of 1970-01-01.
pub const EPOCH_JULIAN_DAY: i32 = 2_440_588;
/// Offset between chrono's days-from-CE numbering and Julian day numbers.
const CE_TO_JULIAN: i32 = 1_721_425;
pub const DAY_IN_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Day boundaries for one render pass. Every interval is half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Buckets {
    pub now: i64,
    pub today: i32,
    pub yesterday_start: i64,
    pub today_start: i64,
    pub tomorrow_start: i64,
    pub day_after_tomorrow_start: i64,
    pub one_week_from_now: i64,
    pub year_start: i64,
    pub year_end: i64,
    #[serde(skip)]
    offset: FixedOffset,
}

impl Buckets {
    pub fn compute(now: i64, utc_offset_seconds: i32) -> Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_seconds).ok_or_else(|| {
            WidgetError::InvalidConfig(format!("utc offset {utc_offset_seconds}s out of range"))
        })?;
        let out_of_range = || WidgetError::TimestampOutOfRange(now);
        let today = julian_day(now, utc_offset_seconds).ok_or_else(out_of_range)?;
        let date = date_for_julian_day(today).ok_or_else(out_of_range)?;

        // Jan 1 of the following year rather than +365 days so leap years line up.
        let year_first =
            NaiveDate::from_ymd_opt(date.year(), 1, 1).ok_or_else(out_of_range)?;
        let next_year_first =
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).ok_or_else(out_of_range)?;

        let start_of = |delta: i32| {
            today
                .checked_add(delta)
                .map(|day| day_start_millis(day, utc_offset_seconds))
                .ok_or_else(out_of_range)
        };
        Ok(Self {
            now,
            today,
            yesterday_start: start_of(-1)?,
            today_start: start_of(0)?,
            tomorrow_start: start_of(1)?,
            day_after_tomorrow_start: start_of(2)?,
            one_week_from_now: start_of(8)?,
            year_start: day_start_millis(julian_day_for_date(year_first), utc_offset_seconds),
            year_end: day_start_millis(julian_day_for_date(next_year_first), utc_offset_seconds),
            offset,
        })
    }

    pub fn utc_offset_seconds(&self) -> i32 {
        self.offset.local_minus_utc()
    }

    /// Local midnight of the given Julian day.
    pub fn day_start(&self, day: i32) -> i64 {
        day_start_millis(day, self.utc_offset_seconds())
    }

    /// Wall-clock time at the pass offset, not at the offset in force at
    /// `millis`.
    pub fn local_time(&self, millis: i64) -> Option<DateTime<FixedOffset>> {
        DateTime::<Utc>::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&self.offset))
    }

    /// Closed `[today_start, tomorrow_start]`, unlike every other bucket: an
    /// event ending exactly at midnight still ends "today".
    pub fn touches_today(&self, millis: i64) -> bool {
        self.today_start <= millis && millis <= self.tomorrow_start
    }
}

pub fn compute_buckets(now: i64, utc_offset_seconds: i32) -> Result<Buckets> {
    Buckets::compute(now, utc_offset_seconds)
}

/// Local Julian day of `millis`, or `None` when it does not fit an `i32`.
pub fn julian_day(millis: i64, utc_offset_seconds: i32) -> Option<i32> {
    let local = millis.checked_add(i64::from(utc_offset_seconds) * 1000)?;
    i32::try_from(local.div_euclid(DAY_IN_MILLIS) + i64::from(EPOCH_JULIAN_DAY)).ok()
}

pub fn day_start_millis(day: i32, utc_offset_seconds: i32) -> i64 {
    (i64::from(day) - i64::from(EPOCH_JULIAN_DAY)) * DAY_IN_MILLIS
        - i64::from(utc_offset_seconds) * 1000
}

pub fn date_for_julian_day(day: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(day.checked_sub(CE_TO_JULIAN)?)
}

pub fn julian_day_for_date(date: NaiveDate) -> i32 {
    date.num_days_from_ce() + CE_TO_JULIAN
}
