//! Daily digest: tasks due today.

use crate::config::DemoFallback;
use crate::gateway::{RequestFailure, TaskGateway};
use crate::model::task::{Task, TaskId, TaskStatus};
use crate::service::task_list::{resolve_listing, DataMode};
use chrono::NaiveDate;
use log::{error, info};

/// Tasks whose due date is `today`, in input order.
pub fn due_today(tasks: &[Task], today: NaiveDate) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| task.due_date.is_some_and(|due| due.date() == today))
        .cloned()
        .collect()
}

/// Today's tasks, refreshed from the full task list.
pub struct DailyDigest<G: TaskGateway> {
    gateway: G,
    fallback: DemoFallback,
    tasks: Vec<Task>,
    mode: DataMode,
}

impl<G: TaskGateway> DailyDigest<G> {
    pub fn new(gateway: G, fallback: DemoFallback) -> Self {
        Self {
            gateway,
            fallback,
            tasks: Vec::new(),
            mode: DataMode::Live,
        }
    }

    /// Reloads every task and keeps the ones due `today`.
    ///
    /// On failure the previous digest stays in place.
    pub async fn refresh(&mut self, today: NaiveDate) -> Result<&[Task], RequestFailure> {
        let result = self.gateway.list_tasks().await;
        let (tasks, mode) = resolve_listing(result, self.fallback).map_err(|err| {
            error!("event=digest_refresh module=digest status=error error={}", err);
            err
        })?;
        self.tasks = due_today(&tasks, today);
        self.mode = mode;
        info!(
            "event=digest_refresh module=digest status=ok count={}",
            self.tasks.len()
        );
        Ok(&self.tasks)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    /// Persists the flipped status of a digest task, then refreshes.
    ///
    /// Ids outside the digest are toggled from `Open`.
    pub async fn toggle_status(
        &mut self,
        task_id: &TaskId,
        today: NaiveDate,
    ) -> Result<TaskStatus, RequestFailure> {
        let next = self
            .tasks
            .iter()
            .find(|task| &task.id == task_id)
            .map_or(TaskStatus::Completed, |task| task.status.toggled());
        self.gateway.update_status(task_id, next).await?;
        self.refresh(today).await?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::due_today;
    use crate::gateway::demo::demo_tasks;
    use crate::model::task::{DueDate, TaskId};
    use chrono::NaiveDate;

    #[test]
    fn due_today_keeps_matching_dates_in_order() {
        let mut tasks = demo_tasks();
        tasks[3].due_date = Some(DueDate::parse("2025-06-10").unwrap());
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();

        let ids = due_today(&tasks, today)
            .into_iter()
            .map(|task| task.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![TaskId::new("2"), TaskId::new("4")]);
    }

    #[test]
    fn undated_tasks_are_never_due() {
        let tasks = demo_tasks();
        let today = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(due_today(&tasks, today).is_empty());
    }
}
