use super::PersistenceResult;
use crate::config::ResolverConfig;
use crate::schedule::{Schedule, ScheduleMetadata};
use crate::task::TaskSpec;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct ScheduleSnapshot {
    #[serde(default)]
    metadata: ScheduleMetadata,
    #[serde(default)]
    config: ResolverConfig,
    tasks: Vec<TaskSpec>,
}

impl ScheduleSnapshot {
    fn from_schedule(schedule: &Schedule) -> PersistenceResult<Self> {
        let tree = schedule.tree();
        let tasks = tree
            .roots()
            .iter()
            .map(|root| TaskSpec::from_tree(tree, *root))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            metadata: schedule.metadata().clone(),
            config: schedule.config().clone(),
            tasks,
        })
    }

    fn into_schedule(self) -> PersistenceResult<Schedule> {
        Ok(Schedule::from_specs(self.metadata, &self.tasks, self.config)?)
    }
}

pub fn save_schedule_to_json<P: AsRef<Path>>(schedule: &Schedule, path: P) -> PersistenceResult<()> {
    let snapshot = ScheduleSnapshot::from_schedule(schedule)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &snapshot)?;
    writer.flush()?;
    Ok(())
}

pub fn load_schedule_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Schedule> {
    let file = File::open(path)?;
    let snapshot: ScheduleSnapshot = serde_json::from_reader(BufReader::new(file))?;
    snapshot.into_schedule()
}

pub fn schedule_to_json_string(schedule: &Schedule) -> PersistenceResult<String> {
    let snapshot = ScheduleSnapshot::from_schedule(schedule)?;
    Ok(serde_json::to_string_pretty(&snapshot)?)
}

/// Accepts either a full snapshot object or a bare array of task records.
pub fn schedule_from_json_str(json: &str) -> PersistenceResult<Schedule> {
    let snapshot = match serde_json::from_str::<ScheduleSnapshot>(json) {
        Ok(snapshot) => snapshot,
        Err(snapshot_err) => match serde_json::from_str::<Vec<TaskSpec>>(json) {
            Ok(tasks) => ScheduleSnapshot {
                metadata: ScheduleMetadata::default(),
                config: ResolverConfig::default(),
                tasks,
            },
            Err(_) => return Err(snapshot_err.into()),
        },
    };
    snapshot.into_schedule()
}
