use super::table::{TaskRow, rows};
use crate::persistence::PersistenceResult;
use crate::time::format_instant;
use crate::timeline::Timeline;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct TaskCsvRecord {
    level: usize,
    name: String,
    label: String,
    start: String,
    end: String,
    duration: String,
    percent: String,
}

impl From<&TaskRow> for TaskCsvRecord {
    fn from(row: &TaskRow) -> Self {
        Self {
            level: row.level,
            name: row.name.clone(),
            label: row.label.clone(),
            start: row.start.map(format_instant).unwrap_or_default(),
            end: row.end.map(format_instant).unwrap_or_default(),
            duration: row.duration.map(|span| span.to_string()).unwrap_or_default(),
            percent: row.percent.map(|p| p.to_string()).unwrap_or_default(),
        }
    }
}

/// Writes one header line and one line per flattened task.
pub fn write_csv<T: Timeline + ?Sized, W: Write>(item: &T, writer: W) -> PersistenceResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows(item) {
        writer.serialize(TaskCsvRecord::from(&row))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_csv<T: Timeline + ?Sized, P: AsRef<Path>>(item: &T, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    write_csv(item, file)
}
