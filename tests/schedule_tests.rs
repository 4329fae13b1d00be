use chrono::{NaiveDate, NaiveDateTime};
use schedule_tree::{Progress, Schedule, ScheduleError, ScheduleMetadata, Task, TaskId, TimeSpan, Timeline};

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn names<'a>(views: impl IntoIterator<Item = schedule_tree::TaskView<'a>>) -> Vec<String> {
    views.into_iter().map(|view| view.name().to_string()).collect()
}

/// R1 { a, b { b1 } }, R2
fn nested_schedule() -> (Schedule, TaskId) {
    let mut metadata = ScheduleMetadata::default();
    metadata.project_name = "Thesis".into();
    let mut schedule = Schedule::new_with_metadata(metadata);
    let r1 = schedule.add_task(Task::new("R1"));
    schedule.add_task(
        Task::new("R2")
            .with_start(at(2024, 4, 1))
            .with_duration(TimeSpan::days(10))
            .with_progress(Progress::new(0, "").unwrap()),
    );
    let tree = schedule.tree_mut();
    tree.add_child(
        r1,
        Task::new("a")
            .with_start(at(2024, 1, 1))
            .with_end(at(2024, 2, 1))
            .with_progress(Progress::new(100, "done").unwrap()),
    )
    .unwrap();
    let b = tree.add_child(r1, Task::new("b")).unwrap();
    tree.add_child(
        b,
        Task::new("b1")
            .with_start(at(2024, 2, 1))
            .with_duration(TimeSpan::days(14))
            .with_progress(Progress::new(50, "").unwrap()),
    )
    .unwrap();
    (schedule, r1)
}

#[test]
fn flatten_lists_tasks_depth_first_with_levels() {
    let (schedule, r1) = nested_schedule();

    let (views, levels) = schedule.flatten_with_levels();
    assert_eq!(names(views), ["R1", "a", "b", "b1", "R2"]);
    assert_eq!(levels, [0, 1, 1, 2, 0]);

    let r1_view = schedule.view(r1).unwrap();
    let (views, levels) = r1_view.flatten_with_levels();
    assert_eq!(names(views), ["R1", "a", "b", "b1"]);
    assert_eq!(levels, [0, 1, 1, 2]);
}

#[test]
fn tasks_at_level_selects_one_depth() {
    let (schedule, _) = nested_schedule();
    assert_eq!(names(schedule.tasks_at_level(0)), ["R1", "R2"]);
    assert_eq!(names(schedule.tasks_at_level(1)), ["a", "b"]);
    assert_eq!(names(schedule.tasks_at_level(2)), ["b1"]);
    assert!(schedule.tasks_at_level(3).is_empty());
}

#[test]
fn schedule_exposes_the_same_timeline_surface() {
    let (schedule, r1) = nested_schedule();

    assert_eq!(schedule.name(), "Thesis");
    assert_eq!(schedule.nickname(), "Thesis");
    assert_eq!(schedule.start(), Some(at(2024, 1, 1)));
    assert_eq!(schedule.end(), Some(at(2024, 4, 11)));
    assert_eq!(schedule.duration(), Some(TimeSpan::days(101)));
    assert_eq!(names(schedule.children()), ["R1", "R2"]);

    let r1 = schedule.view(r1).unwrap();
    assert_eq!(r1.end(), Some(at(2024, 2, 15)));
    // R1 = mean(a 100, b = mean(b1 50)) = 75; schedule = mean(75, 0)
    assert_eq!(r1.percent(), Some(75));
    assert_eq!(schedule.percent(), Some(38));
}

#[test]
fn sort_orders_by_start_then_end() {
    let mut schedule = Schedule::new();
    schedule.add_task(Task::new("late").with_start(at(2024, 3, 1)).with_duration(TimeSpan::days(1)));
    schedule.add_task(Task::new("long").with_start(at(2024, 1, 1)).with_duration(TimeSpan::days(9)));
    schedule.add_task(Task::new("short").with_start(at(2024, 1, 1)).with_duration(TimeSpan::days(2)));

    schedule.sort_tasks(true).unwrap();
    assert_eq!(names(schedule.children()), ["short", "long", "late"]);
}

#[test]
fn sort_with_verification_rejects_undetermined_tasks() {
    let mut schedule = Schedule::new();
    schedule.add_task(Task::new("ok").with_start(at(2024, 3, 1)).with_duration(TimeSpan::days(1)));
    schedule.add_task(Task::new("adrift").with_duration(TimeSpan::days(1)));

    assert!(matches!(schedule.sort_tasks(true), Err(ScheduleError::Underdefined { .. })));
    schedule.sort_tasks(false).unwrap();
    // Unknown starts sort first.
    assert_eq!(names(schedule.children()), ["adrift", "ok"]);
}

#[test]
fn verify_all_checks_every_node() {
    let (schedule, _) = nested_schedule();
    schedule.verify_all().unwrap();

    let mut broken = Schedule::new();
    let parent = broken.add_task(Task::new("parent"));
    broken
        .tree_mut()
        .add_child(parent, Task::new("child").with_start(at(2024, 1, 1)))
        .unwrap();
    // The parent itself verifies only once the child is complete.
    assert!(broken.tree().verify(parent).is_err());
    assert_eq!(
        broken.verify_all(),
        Err(ScheduleError::Underdefined {
            task: "parent".into(),
            known: 1
        })
    );
}

#[test]
fn find_matches_id_or_name() {
    let mut schedule = Schedule::new();
    schedule.add_task(Task::new("Literature review").with_id("lit"));
    assert_eq!(schedule.find("lit").unwrap().name(), "Literature review");
    assert_eq!(schedule.find("Literature review").unwrap().name(), "Literature review");
    assert!(schedule.find("missing").is_none());
}
