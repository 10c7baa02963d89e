//! Client-side filtering and day bucketing for work schedules.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::client::SearchParams;
use crate::types::{Ref, WorkSchedule};

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `start` and `end` are swapped if given backwards.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    /// Monday through Sunday of the week containing `date`.
    pub fn week_of(date: NaiveDate) -> Self {
        let start = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// The range shifted by whole weeks (negative goes back).
    pub fn shift_weeks(&self, weeks: i64) -> Self {
        let offset = Duration::weeks(weeks);
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    /// `tuNgay` / `denNgay` query parameters.
    pub fn to_params(&self) -> SearchParams {
        SearchParams::new()
            .param("tuNgay", self.start.format("%Y-%m-%d").to_string())
            .param("denNgay", self.end.format("%Y-%m-%d").to_string())
    }
}

/// Sort position of a shift within a day; unknown shifts go last.
pub fn shift_rank(shift: &str) -> u8 {
    match shift {
        "Sang" => 0,
        "Chieu" => 1,
        "Toi" => 2,
        "Dem" => 3,
        _ => 4,
    }
}

/// Optional narrowing applied on top of what the backend returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleFilter {
    pub staff_id: Option<String>,
    pub shift: Option<String>,
    pub status: Option<String>,
}

impl ScheduleFilter {
    pub fn matches(&self, schedule: &WorkSchedule) -> bool {
        if let Some(staff_id) = &self.staff_id {
            if schedule.staff.as_ref().and_then(Ref::id) != Some(staff_id.as_str()) {
                return false;
            }
        }
        if let Some(shift) = &self.shift {
            if &schedule.shift != shift {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if schedule.status.as_ref() != Some(status) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, schedules: &'a [WorkSchedule]) -> Vec<&'a WorkSchedule> {
        schedules.iter().filter(|s| self.matches(s)).collect()
    }
}

/// Group schedules by day. Every day of `range` gets an entry, possibly empty;
/// schedules outside the range or without a readable date are dropped. Within a day entries are ordered by
/// shift, ties keeping input order.
pub fn bucket_by_day<'a, I>(schedules: I, range: &DateRange) -> BTreeMap<NaiveDate, Vec<&'a WorkSchedule>>
where
    I: IntoIterator<Item = &'a WorkSchedule>,
{
    let mut buckets: BTreeMap<NaiveDate, Vec<&WorkSchedule>> =
        range.days().map(|day| (day, Vec::new())).collect();
    for schedule in schedules {
        let Some(date) = schedule.work_date() else {
            continue;
        };
        if let Some(day) = buckets.get_mut(&date) {
            day.push(schedule);
        }
    }
    for day in buckets.values_mut() {
        day.sort_by_key(|s| shift_rank(&s.shift));
    }
    buckets
}
