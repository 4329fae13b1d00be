use crate::time::{Instant, TimeSpan, optional_instant};
use crate::timeline::Timeline;
use chrono::Datelike;
use serde::Serialize;

/// One line of a flattened schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRow {
    pub level: usize,
    pub name: String,
    pub label: String,
    #[serde(serialize_with = "optional_instant::serialize")]
    pub start: Option<Instant>,
    #[serde(serialize_with = "optional_instant::serialize")]
    pub end: Option<Instant>,
    pub duration: Option<TimeSpan>,
    pub percent: Option<u8>,
}

/// Flattens `item` depth first into rows carrying resolved values.
pub fn rows<T: Timeline + ?Sized>(item: &T) -> Vec<TaskRow> {
    let (views, levels) = item.flatten_with_levels();
    views
        .iter()
        .zip(levels)
        .map(|(view, level)| TaskRow {
            level,
            name: view.name().to_string(),
            label: view.nickname().to_string(),
            start: view.start(),
            end: view.end(),
            duration: view.duration(),
            percent: view.percent(),
        })
        .collect()
}

/// Months touched by `[start, end]`, grouped by year.
///
/// Gantt sheets use this for their two header rows. Empty when `end`
/// precedes `start`.
pub fn month_span(start: Instant, end: Instant) -> Vec<(i32, Vec<u32>)> {
    let mut out: Vec<(i32, Vec<u32>)> = Vec::new();
    if end < start {
        return out;
    }
    let (mut year, mut month) = (start.year(), start.month());
    while (year, month) <= (end.year(), end.month()) {
        match out.last_mut() {
            Some((last_year, months)) if *last_year == year => months.push(month),
            _ => out.push((year, vec![month])),
        }
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    out
}
