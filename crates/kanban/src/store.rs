//! Task store seam and an in-process implementation.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::status::{StatusSequence, TaskStatus};
use crate::task::{NewTask, Project, Task};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence collaborator for the board.
///
/// No transactions are assumed. `update_task_status` is the only mutation
/// the board core issues itself.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_projects(&self) -> StoreResult<Vec<Project>>;

    async fn list_tasks(&self, project_id: &str) -> StoreResult<Vec<Task>>;

    async fn update_task_status(&self, task_id: &str, status: &TaskStatus) -> StoreResult<()>;

    async fn create_task(&self, task: NewTask) -> StoreResult<Task>;

    async fn delete_task(&self, task_id: &str) -> StoreResult<()>;
}

/// Task store kept entirely in memory.
///
/// Used by tests and the demo mode. Updates can be made to fail on demand
/// to exercise the resync path.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    sequence: StatusSequence,
    projects: Mutex<Vec<Project>>,
    tasks: Mutex<Vec<Task>>,
    fail_updates: AtomicBool,
}

impl MemoryTaskStore {
    pub fn new(sequence: StatusSequence) -> Self {
        Self {
            sequence,
            ..Default::default()
        }
    }

    pub fn with_tasks(sequence: StatusSequence, projects: Vec<Project>, tasks: Vec<Task>) -> Self {
        Self {
            sequence,
            projects: Mutex::new(projects),
            tasks: Mutex::new(tasks),
            fail_updates: AtomicBool::new(false),
        }
    }

    /// Make every following `update_task_status` call fail until reset.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Copy of the stored task, bypassing the async interface.
    pub fn get(&self, task_id: &str) -> Option<Task> {
        self.lock_tasks().iter().find(|t| t.id == task_id).cloned()
    }

    /// Overwrite a task's status directly, as another client would.
    pub fn set_status(&self, task_id: &str, status: TaskStatus) {
        if let Some(task) = self.lock_tasks().iter_mut().find(|t| t.id == task_id) {
            task.status = status;
        }
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<Task>> {
        // Poisoning is ignored, the task list is always left consistent.
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_code(tasks: &[Task]) -> String {
        let highest = tasks
            .iter()
            .filter_map(|t| t.code.strip_prefix('T'))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("T{:03}", highest + 1)
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        Ok(self
            .projects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    async fn list_tasks(&self, project_id: &str) -> StoreResult<Vec<Task>> {
        Ok(self
            .lock_tasks()
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn update_task_status(&self, task_id: &str, status: &TaskStatus) -> StoreResult<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected {
                status: 503,
                message: "updates are disabled".to_string(),
            });
        }

        let mut tasks = self.lock_tasks();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| StoreError::task_not_found(task_id))?;
        task.status = status.clone();
        Ok(())
    }

    async fn create_task(&self, new: NewTask) -> StoreResult<Task> {
        let mut tasks = self.lock_tasks();
        let code = new.code.unwrap_or_else(|| Self::next_code(&tasks));

        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            code,
            project_id: new.project_id,
            title: new.title,
            description: new.description,
            status: new.status.unwrap_or_else(|| self.sequence.first().clone()),
            priority: new.priority,
            assignee: new.assignee,
            tags: new.tags,
            progress: new.progress.min(100),
            start_date: new.start_date,
            due_date: new.due_date,
        };

        tasks.push(task.clone());
        Ok(task)
    }

    async fn delete_task(&self, task_id: &str) -> StoreResult<()> {
        let mut tasks = self.lock_tasks();
        let before = tasks.len();
        tasks.retain(|t| t.id != task_id);
        if tasks.len() == before {
            return Err(StoreError::task_not_found(task_id));
        }
        Ok(())
    }
}
