use tasknest_core::db::open_db_in_memory;
use tasknest_core::service::bucket_service::{BucketService, BucketServiceError};
use tasknest_core::service::task_service::{NewTaskRequest, TaskService};
use tasknest_core::{
    BucketFilter, BucketRepository, RepoError, SqliteBucketRepository, SqliteTaskRepository,
    TaskListQuery, DEFAULT_BUCKET_COLOR, DEFAULT_BUCKET_NAME,
};
use uuid::Uuid;

type SqliteBucketService<'conn> =
    BucketService<SqliteBucketRepository<'conn>, SqliteTaskRepository<'conn>>;

fn service<'conn>(
    conn: &'conn rusqlite::Connection,
    user: Uuid,
) -> SqliteBucketService<'conn> {
    BucketService::new(
        SqliteBucketRepository::try_new(conn, user).unwrap(),
        SqliteTaskRepository::try_new(conn, user).unwrap(),
        user,
    )
}

#[test]
fn ensure_default_seeds_general_once() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let buckets = service(&conn, user);

    let first = buckets.ensure_default().unwrap();
    assert!(first.is_default);
    assert_eq!(first.name, DEFAULT_BUCKET_NAME);
    assert_eq!(first.color, DEFAULT_BUCKET_COLOR);
    assert_eq!(first.position, 0);

    let second = buckets.ensure_default().unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(buckets.list_buckets().unwrap().len(), 1);
}

#[test]
fn default_bucket_is_seeded_per_owner() {
    let conn = open_db_in_memory().unwrap();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let alice_default = service(&conn, alice).ensure_default().unwrap();
    let bob_default = service(&conn, bob).ensure_default().unwrap();

    assert_ne!(alice_default.id, bob_default.id);
    assert_eq!(service(&conn, alice).list_buckets().unwrap().len(), 1);
}

#[test]
fn deleting_the_default_bucket_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let buckets = service(&conn, user);

    let default = buckets.ensure_default().unwrap();
    let err = buckets.delete_bucket(default.id).unwrap_err();
    assert!(matches!(
        err,
        BucketServiceError::DefaultBucketProtected(id) if id == default.id
    ));
    assert!(buckets.get_bucket(default.id).unwrap().is_some());
}

#[test]
fn deleting_a_bucket_reassigns_its_tasks_to_the_default() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let buckets = service(&conn, user);
    let tasks = TaskService::new(SqliteTaskRepository::try_new(&conn, user).unwrap(), user);

    buckets.ensure_default().unwrap();
    let work = buckets.create_bucket("Work", "#336699").unwrap();

    let kept = tasks
        .create_task(NewTaskRequest {
            title: "already home".to_string(),
            ..NewTaskRequest::default()
        })
        .unwrap();
    let orphan = tasks
        .create_task(NewTaskRequest {
            title: "was in work".to_string(),
            bucket_id: Some(work.id),
            ..NewTaskRequest::default()
        })
        .unwrap();

    buckets.delete_bucket(work.id).unwrap();

    assert!(buckets.get_bucket(work.id).unwrap().is_none());

    let reassigned = tasks.get_task(orphan.id).unwrap().unwrap();
    assert_eq!(reassigned.bucket_id, None);
    assert_eq!(reassigned.position, kept.position + 1);

    let in_default = tasks
        .list_tasks(&TaskListQuery {
            bucket: BucketFilter::Bucket(None),
            ..TaskListQuery::default()
        })
        .unwrap();
    assert_eq!(in_default.len(), 2);
}

#[test]
fn deleting_a_middle_bucket_renumbers_the_rest() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let buckets = service(&conn, user);

    buckets.ensure_default().unwrap();
    let work = buckets.create_bucket("Work", "#336699").unwrap();
    buckets.create_bucket("Hobby", "#993366").unwrap();

    buckets.delete_bucket(work.id).unwrap();

    let remaining = buckets.list_buckets().unwrap();
    let names: Vec<&str> = remaining.iter().map(|bucket| bucket.name.as_str()).collect();
    assert_eq!(names, vec!["General", "Hobby"]);
    let positions: Vec<u32> = remaining.iter().map(|bucket| bucket.position).collect();
    assert_eq!(positions, vec![0, 1]);
}

#[test]
fn rename_and_recolor_are_validated() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let buckets = service(&conn, user);

    let bucket = buckets.create_bucket("Chores", "#112233").unwrap();

    let renamed = buckets.rename_bucket(bucket.id, "Housework").unwrap();
    assert_eq!(renamed.name, "Housework");

    let recolored = buckets.recolor_bucket(bucket.id, "#445566").unwrap();
    assert_eq!(recolored.color, "#445566");

    let err = buckets.recolor_bucket(bucket.id, "blue").unwrap_err();
    assert!(matches!(err, BucketServiceError::Repo(_)));
    assert_eq!(
        buckets.get_bucket(bucket.id).unwrap().unwrap().color,
        "#445566"
    );
}

#[test]
fn bucket_read_path_rejects_corrupt_rows() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let repo = SqliteBucketRepository::try_new(&conn, user).unwrap();

    conn.execute(
        "INSERT INTO buckets (uuid, user_id, name, color, position)
         VALUES (?1, ?2, 'Broken', '#123456', -2);",
        rusqlite::params![Uuid::new_v4().to_string(), user.to_string()],
    )
    .unwrap();

    let err = repo.list_buckets().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn unknown_bucket_id_is_reported_as_not_found() {
    let conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let buckets = service(&conn, user);

    let ghost = Uuid::new_v4();
    let err = buckets.rename_bucket(ghost, "anything").unwrap_err();
    assert!(matches!(
        err,
        BucketServiceError::BucketNotFound(id) if id == ghost
    ));
}
