//! CLI entry point.
//!
//! # Responsibility
//! - Exercise the core end to end: backend selection by auth state, default
//!   bucket seeding, and the task/bucket services.
//! - Keep output deterministic for quick local sanity checks.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use tasknest_core::service::bucket_service::BucketService;
use tasknest_core::service::task_service::{NewTaskRequest, TaskService};
use tasknest_core::{
    backend, AuthState, BucketRepository, SessionBackend, TaskListQuery, TaskRepository,
};
use uuid::Uuid;

enum Command {
    Add { title: String },
    List,
    Done { task_id: Uuid },
    Pick,
    Buckets,
    Version,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tasknest: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let command = parse_command(std::env::args().skip(1).collect())?;

    if let Command::Version = command {
        println!("tasknest_core version={}", tasknest_core::core_version());
        return Ok(());
    }

    let data_dir = data_dir()?;
    if let Some(dir) = data_dir.to_str() {
        // Logging failures must not block a local CLI session.
        if let Err(err) = tasknest_core::init_logging(tasknest_core::default_log_level(), dir) {
            eprintln!("tasknest: logging disabled: {err}");
        }
    }

    // Auth is decided outside the core; the CLI reads it from the
    // environment. Unset means an anonymous local-only session.
    let auth = match std::env::var("TASKNEST_USER") {
        Ok(raw) => AuthState::Authenticated {
            user_id: Uuid::parse_str(raw.trim())?,
        },
        Err(_) => AuthState::Anonymous,
    };
    let user_id = auth.user_id();

    let session = SessionBackend::open(&auth, &data_dir)?;
    match &session {
        SessionBackend::Hosted(conn) => {
            let tasks = TaskService::new(backend::hosted_task_repo(conn, user_id)?, user_id);
            let buckets = BucketService::new(
                backend::hosted_bucket_repo(conn, user_id)?,
                backend::hosted_task_repo(conn, user_id)?,
                user_id,
            );
            dispatch(&tasks, &buckets, &command)
        }
        SessionBackend::Local(store) => {
            let tasks = TaskService::new(backend::local_task_repo(store), user_id);
            let buckets = BucketService::new(
                backend::local_bucket_repo(store),
                backend::local_task_repo(store),
                user_id,
            );
            dispatch(&tasks, &buckets, &command)
        }
    }
}

fn dispatch<T, B, BT>(
    tasks: &TaskService<T>,
    buckets: &BucketService<B, BT>,
    command: &Command,
) -> Result<(), Box<dyn Error>>
where
    T: TaskRepository,
    B: BucketRepository,
    BT: TaskRepository,
{
    buckets.ensure_default()?;

    match command {
        Command::Add { title } => {
            let task = tasks.create_task(NewTaskRequest {
                title: title.clone(),
                ..NewTaskRequest::default()
            })?;
            println!("added {} `{}`", task.id, task.title);
        }
        Command::List => {
            for task in tasks.list_tasks(&TaskListQuery::default())? {
                let marker = if task.completed { "x" } else { " " };
                println!("[{marker}] {} {}", task.id, task.title);
            }
        }
        Command::Done { task_id } => {
            let task = tasks.toggle_completed(*task_id)?;
            println!(
                "{} `{}` completed={}",
                task.id, task.title, task.completed
            );
        }
        Command::Pick => match tasks.pick_random(&TaskListQuery::default())? {
            Some(task) => println!("try this one: {} `{}`", task.id, task.title),
            None => println!("nothing left to pick"),
        },
        Command::Buckets => {
            for bucket in buckets.list_buckets()? {
                let marker = if bucket.is_default { "*" } else { " " };
                println!("{marker} {} {} {}", bucket.id, bucket.color, bucket.name);
            }
        }
        Command::Version => unreachable!("handled before backend setup"),
    }

    Ok(())
}

fn parse_command(args: Vec<String>) -> Result<Command, Box<dyn Error>> {
    match args.first().map(String::as_str) {
        Some("add") => {
            let title = args[1..].join(" ");
            if title.trim().is_empty() {
                return Err("usage: tasknest add <title>".into());
            }
            Ok(Command::Add { title })
        }
        Some("list") => Ok(Command::List),
        Some("done") => {
            let raw = args
                .get(1)
                .ok_or("usage: tasknest done <task-id>")?;
            Ok(Command::Done {
                task_id: Uuid::parse_str(raw.trim())?,
            })
        }
        Some("pick") => Ok(Command::Pick),
        Some("buckets") => Ok(Command::Buckets),
        Some("version") => Ok(Command::Version),
        _ => Err("usage: tasknest <add|list|done|pick|buckets|version>".into()),
    }
}

fn data_dir() -> Result<PathBuf, Box<dyn Error>> {
    let base = dirs::data_dir().ok_or("unable to resolve a data directory")?;
    Ok(base.join("tasknest"))
}
