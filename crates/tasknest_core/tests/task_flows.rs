use chrono::NaiveDate;
use std::collections::HashSet;
use tasknest_core::db::open_db_in_memory;
use tasknest_core::service::bucket_service::BucketService;
use tasknest_core::service::task_service::{NewTaskRequest, TaskService, TaskServiceError};
use tasknest_core::{
    BucketFilter, RecurrenceInterval, SqliteBucketRepository, SqliteTaskRepository,
    TaskListQuery,
};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn create_normalizes_labels_and_appends_position() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn, user).unwrap(), user);

    let first = service
        .create_task(NewTaskRequest {
            title: "first".to_string(),
            labels: vec![" Home ".to_string(), "home".to_string(), "Work".to_string()],
            ..NewTaskRequest::default()
        })
        .unwrap();
    assert_eq!(first.position, 0);
    assert_eq!(first.labels, vec!["home", "work"]);

    let second = service
        .create_task(NewTaskRequest {
            title: "second".to_string(),
            ..NewTaskRequest::default()
        })
        .unwrap();
    assert_eq!(second.position, 1);
}

#[test]
fn toggle_flips_completion_both_ways() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn, user).unwrap(), user);

    let task = service
        .create_task(NewTaskRequest {
            title: "one-off".to_string(),
            ..NewTaskRequest::default()
        })
        .unwrap();

    let done = service.toggle_completed(task.id).unwrap();
    assert!(done.completed);
    let undone = service.toggle_completed(task.id).unwrap();
    assert!(!undone.completed);
}

#[test]
fn completing_a_recurring_task_advances_the_due_date_instead() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn, user).unwrap(), user);

    let task = service
        .create_task(NewTaskRequest {
            title: "water plants".to_string(),
            due_date: Some(date(2026, 8, 30)),
            recurrence: Some(RecurrenceInterval::Weekly),
            ..NewTaskRequest::default()
        })
        .unwrap();

    let advanced = service.toggle_completed(task.id).unwrap();
    assert!(!advanced.completed);
    assert_eq!(advanced.due_date, Some(date(2026, 9, 6)));
}

#[test]
fn duplicate_leaves_the_original_alone_and_uses_fresh_subtask_ids() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn, user).unwrap(), user);

    let created = service
        .create_task(NewTaskRequest {
            title: "ship release".to_string(),
            labels: vec!["deploy".to_string()],
            ..NewTaskRequest::default()
        })
        .unwrap();
    let with_subtasks = service.add_subtask(created.id, "tag version").unwrap();
    service
        .toggle_subtask(created.id, with_subtasks.subtasks[0].id)
        .unwrap();

    let copy = service.duplicate_task(created.id).unwrap();
    assert_eq!(copy.title, "ship release (Copy)");
    assert_eq!(copy.labels, vec!["deploy"]);
    assert_eq!(copy.position, 1);
    assert!(!copy.completed);
    assert!(!copy.subtasks[0].completed);

    let original = service.get_task(created.id).unwrap().unwrap();
    assert_eq!(original.title, "ship release");
    assert!(original.subtasks[0].completed);

    let original_ids: HashSet<Uuid> = original.subtasks.iter().map(|s| s.id).collect();
    let copy_ids: HashSet<Uuid> = copy.subtasks.iter().map(|s| s.id).collect();
    assert!(original_ids.is_disjoint(&copy_ids));
}

#[test]
fn subtask_toggle_and_remove_report_missing_ids() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn, user).unwrap(), user);

    let task = service
        .create_task(NewTaskRequest {
            title: "checklist".to_string(),
            ..NewTaskRequest::default()
        })
        .unwrap();
    let task = service.add_subtask(task.id, "step one").unwrap();
    let subtask_id = task.subtasks[0].id;

    let toggled = service.toggle_subtask(task.id, subtask_id).unwrap();
    assert!(toggled.subtasks[0].completed);

    let removed = service.remove_subtask(task.id, subtask_id).unwrap();
    assert!(removed.subtasks.is_empty());

    let err = service.toggle_subtask(task.id, subtask_id).unwrap_err();
    assert!(matches!(err, TaskServiceError::SubtaskNotFound(id) if id == subtask_id));
}

#[test]
fn move_to_bucket_appends_at_target_and_renumbers_source() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let tasks = TaskService::new(SqliteTaskRepository::try_new(&conn, user).unwrap(), user);
    let buckets = BucketService::new(
        SqliteBucketRepository::try_new(&conn, user).unwrap(),
        SqliteTaskRepository::try_new(&conn, user).unwrap(),
        user,
    );

    let work = buckets.create_bucket("Work", "#336699").unwrap();
    let a = tasks
        .create_task(NewTaskRequest {
            title: "a".to_string(),
            ..NewTaskRequest::default()
        })
        .unwrap();
    tasks
        .create_task(NewTaskRequest {
            title: "b".to_string(),
            ..NewTaskRequest::default()
        })
        .unwrap();
    tasks
        .create_task(NewTaskRequest {
            title: "c".to_string(),
            ..NewTaskRequest::default()
        })
        .unwrap();

    let moved = tasks.move_to_bucket(a.id, Some(work.id)).unwrap();
    assert_eq!(moved.bucket_id, Some(work.id));
    assert_eq!(moved.position, 0);

    let remaining = tasks
        .list_tasks(&TaskListQuery {
            bucket: BucketFilter::Bucket(None),
            ..TaskListQuery::default()
        })
        .unwrap();
    let titles: Vec<&str> = remaining.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(titles, vec!["b", "c"]);
    let positions: Vec<u32> = remaining.iter().map(|task| task.position).collect();
    assert_eq!(positions, vec![0, 1]);
}

#[test]
fn calendar_grouping_collects_a_month_by_day() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn, user).unwrap(), user);

    for (title, due) in [
        ("early", Some(date(2026, 9, 3))),
        ("also early", Some(date(2026, 9, 3))),
        ("late", Some(date(2026, 9, 28))),
        ("next month", Some(date(2026, 10, 1))),
        ("undated", None),
    ] {
        service
            .create_task(NewTaskRequest {
                title: title.to_string(),
                due_date: due,
                ..NewTaskRequest::default()
            })
            .unwrap();
    }

    let by_day = service.tasks_by_day(2026, 9).unwrap();
    assert_eq!(by_day.len(), 2);
    assert_eq!(by_day.get(&date(2026, 9, 3)).unwrap().len(), 2);
    assert_eq!(by_day.get(&date(2026, 9, 28)).unwrap().len(), 1);

    let due_on = service.tasks_due_on(date(2026, 9, 3)).unwrap();
    assert_eq!(due_on.len(), 2);

    let err = service.tasks_by_day(2026, 13).unwrap_err();
    assert!(matches!(
        err,
        TaskServiceError::InvalidCalendarMonth {
            year: 2026,
            month: 13
        }
    ));
}

#[test]
fn random_pick_only_returns_matching_incomplete_tasks() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn, user).unwrap(), user);

    assert!(service.pick_random(&TaskListQuery::default()).unwrap().is_none());

    let open_task = service
        .create_task(NewTaskRequest {
            title: "open".to_string(),
            ..NewTaskRequest::default()
        })
        .unwrap();
    let done_task = service
        .create_task(NewTaskRequest {
            title: "done".to_string(),
            ..NewTaskRequest::default()
        })
        .unwrap();
    service.toggle_completed(done_task.id).unwrap();

    for _ in 0..10 {
        let picked = service.pick_random(&TaskListQuery::default()).unwrap().unwrap();
        assert_eq!(picked.id, open_task.id);
    }
}
