//! Fixed demo dataset used when demo fallback is switched on.

use crate::model::task::{DueDate, Task, TaskId, TaskStatus};

/// Returns the four-task demo list shown in degraded/demo mode.
pub fn demo_tasks() -> Vec<Task> {
    vec![
        demo_task(
            "1",
            "Follow up with marketing team on Q3 campaign",
            Some("2025-06-15"),
            TaskStatus::Open,
            "2025-05-20T10:30:00Z",
        ),
        demo_task(
            "2",
            "Prepare presentation for client meeting",
            Some("2025-06-10"),
            TaskStatus::Open,
            "2025-05-21T14:15:00Z",
        ),
        demo_task(
            "3",
            "Review budget proposal",
            Some("2025-06-05"),
            TaskStatus::Completed,
            "2025-05-19T09:45:00Z",
        ),
        demo_task(
            "4",
            "Send weekly progress report to team",
            None,
            TaskStatus::Open,
            "2025-05-22T16:00:00Z",
        ),
    ]
}

fn demo_task(
    id: &str,
    description: &str,
    due: Option<&str>,
    status: TaskStatus,
    created_at: &str,
) -> Task {
    Task {
        id: TaskId::new(id),
        description: description.to_string(),
        due_date: due.and_then(|value| DueDate::parse(value).ok()),
        status,
        is_important: false,
        note_id: None,
        created_at: created_at.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::demo_tasks;

    #[test]
    fn demo_dataset_is_stable() {
        let tasks = demo_tasks();
        assert_eq!(tasks.len(), 4);
        assert_eq!(tasks.iter().filter(|task| task.is_completed()).count(), 1);
        assert!(tasks.iter().filter(|task| task.due_date.is_some()).count() == 3);
    }
}
