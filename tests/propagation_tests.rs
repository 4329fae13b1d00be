use chrono::{NaiveDate, NaiveDateTime};
use schedule_tree::{
    Dependency, Instant, PropagationOptions, RelationKind, Schedule, ScheduleError, Task, TaskTree,
    TimeSpan, Timeline,
};

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn resolved(tree: &TaskTree) -> Vec<(Option<Instant>, Option<Instant>, Option<TimeSpan>)> {
    tree.ids()
        .map(|id| {
            let view = tree.view(id).unwrap();
            (view.start(), view.end(), view.duration())
        })
        .collect()
}

#[test]
fn starts_after_places_b_at_the_end_of_a() {
    let mut tree = TaskTree::new();
    let a = tree.add_root(Task::new("A").with_start(at(2024, 1, 1)).with_duration(TimeSpan::parse("7d0:0:0").unwrap()));
    let b = tree.add_root(Task::new("B").with_duration(TimeSpan::days(14)));

    tree.depend_on(b, a, RelationKind::StartsAfter).unwrap();

    let a_view = tree.view(a).unwrap();
    let b_view = tree.view(b).unwrap();
    assert_eq!(a_view.end(), Some(at(2024, 1, 8)));
    assert_eq!(b_view.start(), a_view.end());
    assert_eq!(b_view.end(), Some(at(2024, 1, 22)));
    b_view.verify().unwrap();
}

#[test]
fn add_dependency_without_resolution_leaves_fields_alone() {
    let mut tree = TaskTree::new();
    let a = tree.add_root(Task::new("A").with_start(at(2024, 1, 1)).with_duration(TimeSpan::days(7)));
    let b = tree.add_root(Task::new("B").with_duration(TimeSpan::days(14)));

    tree.add_dependency(b, Dependency::new(a, RelationKind::StartsAfter), false).unwrap();
    assert_eq!(tree.task(b).unwrap().start, None);

    tree.update_from_dependencies(b, PropagationOptions::verified()).unwrap();
    assert_eq!(tree.task(b).unwrap().start, Some(at(2024, 1, 8)));
}

#[test]
fn end_relations_write_the_end_field() {
    let mut tree = TaskTree::new();
    let a = tree.add_root(Task::new("A").with_start(at(2024, 1, 10)).with_duration(TimeSpan::days(5)));
    let before = tree.add_root(Task::new("before").with_duration(TimeSpan::days(2)));
    let with = tree.add_root(Task::new("with").with_duration(TimeSpan::days(2)));

    tree.depend_on(before, a, RelationKind::EndsBefore).unwrap();
    tree.depend_on(with, a, RelationKind::EndsWith).unwrap();

    assert_eq!(tree.view(before).unwrap().end(), Some(at(2024, 1, 10)));
    assert_eq!(tree.view(before).unwrap().start(), Some(at(2024, 1, 8)));
    assert_eq!(tree.view(with).unwrap().end(), Some(at(2024, 1, 15)));
}

#[test]
fn later_dependencies_win_on_the_same_field() {
    let mut tree = TaskTree::new();
    let a = tree.add_root(Task::new("A").with_start(at(2024, 1, 1)).with_duration(TimeSpan::days(7)));
    let b = tree.add_root(Task::new("B").with_duration(TimeSpan::days(1)));

    tree.add_dependency(b, Dependency::new(a, RelationKind::StartsWith), false).unwrap();
    tree.add_dependency(b, Dependency::new(a, RelationKind::StartsAfter), false).unwrap();
    tree.update_from_dependencies(b, PropagationOptions::default()).unwrap();

    assert_eq!(tree.view(b).unwrap().start(), Some(at(2024, 1, 8)));
}

#[test]
fn children_can_depend_on_their_parent() {
    let mut tree = TaskTree::new();
    let parent = tree.add_root(Task::new("P").with_start(at(2024, 1, 1)));
    let first = tree.add_child(parent, Task::new("first").with_duration(TimeSpan::days(2))).unwrap();
    let second = tree.add_child(parent, Task::new("second").with_duration(TimeSpan::days(3))).unwrap();
    tree.add_dependency(first, Dependency::new(parent, RelationKind::StartsWith), false).unwrap();
    tree.add_dependency(second, Dependency::new(first, RelationKind::StartsAfter), false).unwrap();

    tree.update_from_dependencies(parent, PropagationOptions::verified()).unwrap();

    assert_eq!(tree.view(first).unwrap().start(), Some(at(2024, 1, 1)));
    assert_eq!(tree.view(second).unwrap().start(), Some(at(2024, 1, 3)));
    let p = tree.view(parent).unwrap();
    assert_eq!(p.end(), Some(at(2024, 1, 6)));
    assert_eq!(p.duration(), Some(TimeSpan::days(5)));
}

#[test]
fn parent_can_depend_on_a_child_within_one_pass() {
    let mut tree = TaskTree::new();
    let parent = tree.add_root(Task::new("P"));
    let first = tree
        .add_child(parent, Task::new("first").with_start(at(2024, 1, 1)).with_duration(TimeSpan::days(2)))
        .unwrap();
    let last = tree.add_child(parent, Task::new("last").with_duration(TimeSpan::days(3))).unwrap();
    tree.add_dependency(last, Dependency::new(first, RelationKind::StartsAfter), false).unwrap();
    tree.add_dependency(parent, Dependency::new(last, RelationKind::EndsWith), false).unwrap();

    tree.update_from_dependencies(parent, PropagationOptions::default()).unwrap();

    let p = tree.task(parent).unwrap();
    assert_eq!(p.end, Some(at(2024, 1, 6)));
    tree.verify(parent).unwrap();
}

#[test]
fn shallow_pass_skips_children() {
    let mut tree = TaskTree::new();
    let anchor = tree.add_root(Task::new("anchor").with_start(at(2024, 5, 1)).with_duration(TimeSpan::days(1)));
    let parent = tree.add_root(Task::new("P"));
    let child = tree.add_child(parent, Task::new("c").with_duration(TimeSpan::days(1))).unwrap();
    tree.add_dependency(child, Dependency::new(anchor, RelationKind::StartsWith), false).unwrap();

    tree.update_from_dependencies(parent, PropagationOptions::shallow()).unwrap();
    assert_eq!(tree.task(child).unwrap().start, None);

    tree.update_from_dependencies(parent, PropagationOptions::default()).unwrap();
    assert_eq!(tree.task(child).unwrap().start, Some(at(2024, 5, 1)));
}

#[test]
fn second_pass_changes_nothing_on_a_consistent_tree() {
    let mut schedule = Schedule::new();
    let a = schedule.add_task(Task::new("A").with_start(at(2024, 1, 1)).with_duration(TimeSpan::days(7)));
    let phase = schedule.add_task(Task::new("phase"));
    let tree = schedule.tree_mut();
    let x = tree.add_child(phase, Task::new("x").with_duration(TimeSpan::days(3))).unwrap();
    let y = tree.add_child(phase, Task::new("y").with_duration(TimeSpan::days(4))).unwrap();
    tree.add_dependency(x, Dependency::new(a, RelationKind::StartsAfter), false).unwrap();
    tree.add_dependency(y, Dependency::new(x, RelationKind::StartsAfter), false).unwrap();

    schedule.update_from_dependencies(PropagationOptions::default()).unwrap();
    let first = resolved(schedule.tree());
    schedule.update_from_dependencies(PropagationOptions::default()).unwrap();
    let second = resolved(schedule.tree());

    assert_eq!(first, second);
    assert_eq!(schedule.view(phase).unwrap().end(), Some(at(2024, 1, 15)));
    schedule.verify_all().unwrap();
}

#[test]
fn indirect_chains_need_repeated_passes() {
    let mut schedule = Schedule::new();
    // Listed before the task it depends on, so the first pass cannot see it.
    let late = schedule.add_task(Task::new("late").with_duration(TimeSpan::days(1)));
    let middle = schedule.add_task(Task::new("middle").with_duration(TimeSpan::days(2)));
    let first = schedule.add_task(Task::new("first").with_start(at(2024, 1, 1)).with_duration(TimeSpan::days(1)));
    let tree = schedule.tree_mut();
    tree.add_dependency(late, Dependency::new(middle, RelationKind::StartsAfter), false).unwrap();
    tree.add_dependency(middle, Dependency::new(first, RelationKind::StartsAfter), false).unwrap();

    schedule.update_from_dependencies(PropagationOptions::default()).unwrap();
    assert_eq!(schedule.view(middle).unwrap().start(), Some(at(2024, 1, 2)));
    assert_eq!(schedule.view(late).unwrap().start(), None);

    schedule.update_from_dependencies(PropagationOptions::default()).unwrap();
    assert_eq!(schedule.view(late).unwrap().start(), Some(at(2024, 1, 4)));
}

#[test]
fn verified_pass_reports_an_underdefined_task() {
    let mut tree = TaskTree::new();
    let a = tree.add_root(Task::new("A").with_duration(TimeSpan::days(7)));
    let b = tree.add_root(Task::new("B").with_duration(TimeSpan::days(1)));
    tree.add_dependency(b, Dependency::new(a, RelationKind::StartsAfter), false).unwrap();

    let err = tree.update_from_dependencies(b, PropagationOptions::verified()).unwrap_err();
    assert_eq!(
        err,
        ScheduleError::Underdefined {
            task: "B".into(),
            known: 1
        }
    );
}
