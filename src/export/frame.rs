use super::table::rows;
use crate::persistence::PersistenceResult;
use crate::timeline::Timeline;
use polars::prelude::*;

/// Flattened schedule as a `DataFrame` with columns `level`, `name`,
/// `label`, `start`, `end` (datetime, µs), `duration` (µs) and `percent`.
pub fn to_dataframe<T: Timeline + ?Sized>(item: &T) -> PersistenceResult<DataFrame> {
    let rows = rows(item);

    let levels: Vec<i64> = rows.iter().map(|row| row.level as i64).collect();
    let names: Vec<&str> = rows.iter().map(|row| row.name.as_str()).collect();
    let labels: Vec<&str> = rows.iter().map(|row| row.label.as_str()).collect();
    let starts: Vec<Option<i64>> = rows
        .iter()
        .map(|row| row.start.map(|t| t.and_utc().timestamp_micros()))
        .collect();
    let ends: Vec<Option<i64>> = rows
        .iter()
        .map(|row| row.end.map(|t| t.and_utc().timestamp_micros()))
        .collect();
    let durations: Vec<Option<i64>> = rows
        .iter()
        .map(|row| row.duration.and_then(|span| span.as_delta().num_microseconds()))
        .collect();
    let percents: Vec<Option<i32>> = rows.iter().map(|row| row.percent.map(i32::from)).collect();

    let datetime = DataType::Datetime(TimeUnit::Microseconds, None);
    let columns: Vec<Column> = vec![
        Series::new(PlSmallStr::from_static("level"), levels).into_column(),
        Series::new(PlSmallStr::from_static("name"), names).into_column(),
        Series::new(PlSmallStr::from_static("label"), labels).into_column(),
        Series::new(PlSmallStr::from_static("start"), starts)
            .cast(&datetime)?
            .into_column(),
        Series::new(PlSmallStr::from_static("end"), ends)
            .cast(&datetime)?
            .into_column(),
        Series::new(PlSmallStr::from_static("duration"), durations)
            .cast(&DataType::Duration(TimeUnit::Microseconds))?
            .into_column(),
        Series::new(PlSmallStr::from_static("percent"), percents).into_column(),
    ];
    Ok(DataFrame::new(columns)?)
}
