//! Integration tests for the database layer.
//!
//! These tests verify the core repository operations using an in-memory
//! SQLite database. Tests are organized by operation.

use taskboard::db::Database;
use taskboard::error::{ErrorCode, RpcError};
use taskboard::types::{ListQuery, NewTask, SortDirection, SortKey, TaskPatch, TaskStatus};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

/// Helper to build a pending task input with the given title and due date.
fn new_task(title: &str, due_date: i64) -> NewTask {
    NewTask {
        title: title.to_string(),
        description: None,
        due_date,
        status: TaskStatus::Pending,
    }
}

/// Epoch milliseconds for midnight UTC on a day in January 2024.
fn jan_2024(day: u32) -> i64 {
    chrono::NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_millis()
}

/// Extract the structured error from a repository failure.
fn as_rpc_error(err: anyhow::Error) -> RpcError {
    RpcError::from(err)
}

mod create_tests {
    use super::*;

    #[test]
    fn create_assigns_id_and_equal_timestamps() {
        let db = setup_db();

        let task = db.create_task(new_task("Write report", jan_2024(10))).unwrap();

        assert!(task.id > 0);
        assert_eq!(task.title, "Write report");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(task.due_date, jan_2024(10));
    }

    #[test]
    fn create_with_explicit_status() {
        let db = setup_db();

        let task = db
            .create_task(NewTask {
                title: "Ship release".to_string(),
                description: Some("v1.0".to_string()),
                due_date: jan_2024(15),
                status: TaskStatus::InProgress,
            })
            .unwrap();

        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.description.as_deref(), Some("v1.0"));
    }

    #[test]
    fn sequential_creates_get_strictly_increasing_ids() {
        let db = setup_db();

        let a = db.create_task(new_task("a", jan_2024(10))).unwrap();
        let b = db.create_task(new_task("b", jan_2024(11))).unwrap();
        let c = db.create_task(new_task("c", jan_2024(12))).unwrap();

        assert!(a.id < b.id);
        assert!(b.id < c.id);
    }

    #[test]
    fn null_description_round_trips_as_null() {
        let db = setup_db();

        let created = db.create_task(new_task("no notes", jan_2024(10))).unwrap();
        let fetched = db.get_task(created.id).unwrap().unwrap();

        // Null stays null, distinct from empty string
        assert_eq!(fetched.description, None);
        assert_ne!(fetched.description, Some(String::new()));
    }
}

mod get_tests {
    use super::*;

    #[test]
    fn get_returns_created_task() {
        let db = setup_db();
        let created = db.create_task(new_task("find me", jan_2024(10))).unwrap();

        let found = db.get_task(created.id).unwrap();

        assert!(found.is_some());
        assert_eq!(found.unwrap().title, "find me");
    }

    #[test]
    fn get_returns_none_for_unknown_id() {
        let db = setup_db();

        let result = db.get_task(9999).unwrap();

        assert!(result.is_none());
    }
}

mod list_tests {
    use super::*;

    #[test]
    fn list_returns_all_tasks_without_filter() {
        let db = setup_db();
        db.create_task(new_task("a", jan_2024(10))).unwrap();
        db.create_task(NewTask {
            title: "b".to_string(),
            description: None,
            due_date: jan_2024(11),
            status: TaskStatus::Completed,
        })
        .unwrap();

        let tasks = db.list_tasks(&ListQuery::default()).unwrap();

        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn list_on_empty_store_is_empty_not_an_error() {
        let db = setup_db();

        let tasks = db.list_tasks(&ListQuery::default()).unwrap();

        assert!(tasks.is_empty());
    }

    #[test]
    fn status_filter_returns_only_matching_tasks() {
        let db = setup_db();
        db.create_task(new_task("p1", jan_2024(10))).unwrap();
        db.create_task(NewTask {
            title: "done".to_string(),
            description: None,
            due_date: jan_2024(11),
            status: TaskStatus::Completed,
        })
        .unwrap();
        db.create_task(new_task("p2", jan_2024(12))).unwrap();

        let tasks = db
            .list_tasks(&ListQuery {
                status: Some(TaskStatus::Pending),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Pending));
    }

    #[test]
    fn title_sort_is_lexicographic() {
        let db = setup_db();
        db.create_task(new_task("banana", jan_2024(12))).unwrap();
        db.create_task(new_task("apple", jan_2024(11))).unwrap();
        db.create_task(new_task("cherry", jan_2024(10))).unwrap();

        let asc = db
            .list_tasks(&ListQuery {
                sort_by: SortKey::Title,
                ..Default::default()
            })
            .unwrap();
        let titles: Vec<&str> = asc.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["apple", "banana", "cherry"]);

        let desc = db
            .list_tasks(&ListQuery {
                sort_by: SortKey::Title,
                sort_direction: SortDirection::Desc,
                ..Default::default()
            })
            .unwrap();
        let titles: Vec<&str> = desc.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["cherry", "banana", "apple"]);
    }

    #[test]
    fn due_date_sort_descending() {
        let db = setup_db();
        db.create_task(new_task("early", jan_2024(10))).unwrap();
        db.create_task(new_task("late", jan_2024(25))).unwrap();
        db.create_task(new_task("middle", jan_2024(17))).unwrap();

        let tasks = db
            .list_tasks(&ListQuery {
                sort_by: SortKey::DueDate,
                sort_direction: SortDirection::Desc,
                ..Default::default()
            })
            .unwrap();

        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["late", "middle", "early"]);
    }

    #[test]
    fn filter_and_sort_compose() {
        let db = setup_db();

        // 4 tasks, due dates Jan 10..25, statuses pending/in_progress/completed/pending
        db.create_task(new_task("first pending", jan_2024(10))).unwrap();
        db.create_task(NewTask {
            title: "working".to_string(),
            description: None,
            due_date: jan_2024(15),
            status: TaskStatus::InProgress,
        })
        .unwrap();
        db.create_task(NewTask {
            title: "done".to_string(),
            description: None,
            due_date: jan_2024(20),
            status: TaskStatus::Completed,
        })
        .unwrap();
        db.create_task(new_task("second pending", jan_2024(25))).unwrap();

        let tasks = db
            .list_tasks(&ListQuery {
                status: Some(TaskStatus::Pending),
                sort_by: SortKey::DueDate,
                sort_direction: SortDirection::Asc,
            })
            .unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "first pending");
        assert_eq!(tasks[1].title, "second pending");
    }
}

mod update_tests {
    use super::*;

    #[test]
    fn update_changes_only_provided_fields() {
        let db = setup_db();
        let task = db
            .create_task(NewTask {
                title: "original".to_string(),
                description: Some("notes".to_string()),
                due_date: jan_2024(10),
                status: TaskStatus::Pending,
            })
            .unwrap();

        let updated = db
            .update_task(
                task.id,
                TaskPatch {
                    title: Some("renamed".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.description.as_deref(), Some("notes"));
        assert_eq!(updated.due_date, jan_2024(10));
        assert_eq!(updated.status, TaskStatus::Pending);
    }

    #[test]
    fn update_without_status_preserves_prior_status() {
        let db = setup_db();
        let task = db
            .create_task(NewTask {
                title: "t".to_string(),
                description: None,
                due_date: jan_2024(10),
                status: TaskStatus::InProgress,
            })
            .unwrap();

        let updated = db
            .update_task(
                task.id,
                TaskPatch {
                    due_date: Some(jan_2024(12)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.status, TaskStatus::InProgress);
    }

    #[test]
    fn update_always_refreshes_updated_at() {
        let db = setup_db();
        let task = db.create_task(new_task("t", jan_2024(10))).unwrap();

        // Small delay to ensure timestamp difference
        std::thread::sleep(std::time::Duration::from_millis(10));

        let updated = db.update_task(task.id, TaskPatch::default()).unwrap();

        assert!(updated.updated_at > task.updated_at);
        assert_eq!(updated.created_at, task.created_at);
    }

    #[test]
    fn update_can_clear_description_explicitly() {
        let db = setup_db();
        let task = db
            .create_task(NewTask {
                title: "t".to_string(),
                description: Some("to be removed".to_string()),
                due_date: jan_2024(10),
                status: TaskStatus::Pending,
            })
            .unwrap();

        let updated = db
            .update_task(
                task.id,
                TaskPatch {
                    description: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.description, None);
        let fetched = db.get_task(task.id).unwrap().unwrap();
        assert_eq!(fetched.description, None);
    }

    #[test]
    fn update_fails_for_unknown_id() {
        let db = setup_db();

        let err = db.update_task(42, TaskPatch::default()).unwrap_err();

        assert_eq!(as_rpc_error(err).code, ErrorCode::TaskNotFound);
    }

    #[test]
    fn update_fails_for_just_deleted_id() {
        let db = setup_db();
        let task = db.create_task(new_task("gone", jan_2024(10))).unwrap();
        db.delete_task(task.id).unwrap();

        let err = db
            .update_task(
                task.id,
                TaskPatch {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap_err();

        assert_eq!(as_rpc_error(err).code, ErrorCode::TaskNotFound);
    }
}

mod delete_tests {
    use super::*;

    #[test]
    fn delete_then_get_returns_none() {
        let db = setup_db();
        let task = db.create_task(new_task("ephemeral", jan_2024(10))).unwrap();

        db.delete_task(task.id).unwrap();

        assert!(db.get_task(task.id).unwrap().is_none());
    }

    #[test]
    fn delete_fails_for_unknown_id() {
        let db = setup_db();

        let err = db.delete_task(123).unwrap_err();

        assert_eq!(as_rpc_error(err).code, ErrorCode::TaskNotFound);
    }

    #[test]
    fn delete_leaves_other_tasks_untouched() {
        let db = setup_db();
        let a = db
            .create_task(NewTask {
                title: "keep a".to_string(),
                description: Some("alpha".to_string()),
                due_date: jan_2024(10),
                status: TaskStatus::Pending,
            })
            .unwrap();
        let b = db.create_task(new_task("remove", jan_2024(15))).unwrap();
        let c = db
            .create_task(NewTask {
                title: "keep c".to_string(),
                description: None,
                due_date: jan_2024(20),
                status: TaskStatus::Completed,
            })
            .unwrap();

        db.delete_task(b.id).unwrap();

        let remaining = db.list_tasks(&ListQuery::default()).unwrap();
        assert_eq!(remaining.len(), 2);

        let kept_a = db.get_task(a.id).unwrap().unwrap();
        assert_eq!(kept_a.title, "keep a");
        assert_eq!(kept_a.description.as_deref(), Some("alpha"));
        assert_eq!(kept_a.updated_at, a.updated_at);

        let kept_c = db.get_task(c.id).unwrap().unwrap();
        assert_eq!(kept_c.status, TaskStatus::Completed);
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let db = setup_db();
        let a = db.create_task(new_task("a", jan_2024(10))).unwrap();
        db.delete_task(a.id).unwrap();

        let b = db.create_task(new_task("b", jan_2024(11))).unwrap();

        assert!(b.id > a.id);
    }
}

mod persistence_tests {
    use super::*;

    #[test]
    fn tasks_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.db");

        let created = {
            let db = Database::open(&path).unwrap();
            db.create_task(new_task("durable", jan_2024(10))).unwrap()
        };

        // Re-opening runs migrations again; they must be idempotent.
        let db = Database::open(&path).unwrap();
        let fetched = db.get_task(created.id).unwrap().unwrap();

        assert_eq!(fetched.title, "durable");
        assert_eq!(fetched.created_at, created.created_at);
    }
}
