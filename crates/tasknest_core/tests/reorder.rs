use tasknest_core::db::open_db_in_memory;
use tasknest_core::service::bucket_service::BucketService;
use tasknest_core::service::task_service::{NewTaskRequest, TaskService, TaskServiceError};
use tasknest_core::{
    BucketFilter, SqliteBucketRepository, SqliteTaskRepository, TaskListQuery,
};
use uuid::Uuid;

fn seed_tasks(service: &TaskService<SqliteTaskRepository<'_>>, titles: &[&str]) {
    for title in titles {
        service
            .create_task(NewTaskRequest {
                title: (*title).to_string(),
                ..NewTaskRequest::default()
            })
            .unwrap();
    }
}

#[test]
fn dragging_index_3_to_0_in_a_5_task_list_renumbers_densely() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn, user).unwrap(), user);

    seed_tasks(&service, &["a", "b", "c", "d", "e"]);

    let reordered = service.reorder(None, 3, 0).unwrap();
    let titles: Vec<&str> = reordered.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(titles, vec!["d", "a", "b", "c", "e"]);

    let positions: Vec<u32> = reordered.iter().map(|task| task.position).collect();
    assert_eq!(positions, vec![0, 1, 2, 3, 4]);
}

#[test]
fn reorder_persists_the_new_sequence() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn, user).unwrap(), user);

    seed_tasks(&service, &["a", "b", "c"]);
    service.reorder(None, 0, 2).unwrap();

    let listed = service
        .list_tasks(&TaskListQuery {
            bucket: BucketFilter::Bucket(None),
            ..TaskListQuery::default()
        })
        .unwrap();
    let titles: Vec<&str> = listed.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(titles, vec!["b", "c", "a"]);
    let positions: Vec<u32> = listed.iter().map(|task| task.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
}

#[test]
fn reorder_to_same_index_is_a_no_op_permutation() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn, user).unwrap(), user);

    seed_tasks(&service, &["a", "b", "c"]);
    let reordered = service.reorder(None, 1, 1).unwrap();
    let titles: Vec<&str> = reordered.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "b", "c"]);
}

#[test]
fn reorder_rejects_out_of_range_indices() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn, user).unwrap(), user);

    seed_tasks(&service, &["a", "b"]);
    let err = service.reorder(None, 5, 0).unwrap_err();
    assert!(matches!(
        err,
        TaskServiceError::InvalidReorder {
            from_index: 5,
            to_index: 0,
            len: 2
        }
    ));
}

#[test]
fn reorder_only_touches_the_target_bucket() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let tasks = TaskService::new(SqliteTaskRepository::try_new(&conn, user).unwrap(), user);
    let buckets = BucketService::new(
        SqliteBucketRepository::try_new(&conn, user).unwrap(),
        SqliteTaskRepository::try_new(&conn, user).unwrap(),
        user,
    );

    let work = buckets.create_bucket("Work", "#336699").unwrap();
    seed_tasks(&tasks, &["home-a", "home-b"]);
    for title in ["work-a", "work-b", "work-c"] {
        tasks
            .create_task(NewTaskRequest {
                title: title.to_string(),
                bucket_id: Some(work.id),
                ..NewTaskRequest::default()
            })
            .unwrap();
    }

    tasks.reorder(Some(work.id), 2, 0).unwrap();

    let home = tasks
        .list_tasks(&TaskListQuery {
            bucket: BucketFilter::Bucket(None),
            ..TaskListQuery::default()
        })
        .unwrap();
    let home_titles: Vec<&str> = home.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(home_titles, vec!["home-a", "home-b"]);

    let work_tasks = tasks
        .list_tasks(&TaskListQuery {
            bucket: BucketFilter::Bucket(Some(work.id)),
            ..TaskListQuery::default()
        })
        .unwrap();
    let work_titles: Vec<&str> = work_tasks.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(work_titles, vec!["work-c", "work-a", "work-b"]);
}

#[test]
fn bucket_reorder_renumbers_densely() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let buckets = BucketService::new(
        SqliteBucketRepository::try_new(&conn, user).unwrap(),
        SqliteTaskRepository::try_new(&conn, user).unwrap(),
        user,
    );

    buckets.ensure_default().unwrap();
    buckets.create_bucket("Work", "#336699").unwrap();
    buckets.create_bucket("Hobby", "#993366").unwrap();

    let reordered = buckets.reorder(2, 0).unwrap();
    let names: Vec<&str> = reordered.iter().map(|bucket| bucket.name.as_str()).collect();
    assert_eq!(names, vec!["Hobby", "General", "Work"]);
    let positions: Vec<u32> = reordered.iter().map(|bucket| bucket.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
}
