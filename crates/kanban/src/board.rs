//! Per-status projection of a task list.

use crate::status::{StatusSequence, TaskStatus};
use crate::task::Task;

/// Tasks partitioned into one bucket per status of a [`StatusSequence`].
///
/// Built once per task-list change. Tasks keep the order they were supplied
/// in; tasks whose status is not in the sequence are set aside in
/// [`TaskBoard::excluded`] rather than shown.
#[derive(Debug, Clone)]
pub struct TaskBoard {
    sequence: StatusSequence,
    buckets: Vec<Vec<Task>>,
    excluded: Vec<Task>,
}

impl TaskBoard {
    pub fn partition(sequence: &StatusSequence, tasks: &[Task]) -> Self {
        let mut buckets: Vec<Vec<Task>> = vec![Vec::new(); sequence.len()];
        let mut excluded = Vec::new();

        for task in tasks {
            match sequence.index_of(&task.status) {
                Some(index) => buckets[index].push(task.clone()),
                None => excluded.push(task.clone()),
            }
        }

        Self {
            sequence: sequence.clone(),
            buckets,
            excluded,
        }
    }

    pub fn empty(sequence: &StatusSequence) -> Self {
        Self::partition(sequence, &[])
    }

    pub fn sequence(&self) -> &StatusSequence {
        &self.sequence
    }

    /// Tasks in the bucket for `status`, empty if the status is not a column.
    pub fn bucket(&self, status: &TaskStatus) -> &[Task] {
        self.sequence
            .index_of(status)
            .map(|i| self.buckets[i].as_slice())
            .unwrap_or(&[])
    }

    pub fn bucket_at(&self, column: usize) -> &[Task] {
        self.buckets.get(column).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, status: &TaskStatus) -> usize {
        self.bucket(status).len()
    }

    /// `(status, count)` for every column, in sequence order.
    pub fn counts(&self) -> Vec<(TaskStatus, usize)> {
        self.sequence
            .iter()
            .zip(&self.buckets)
            .map(|(status, bucket)| (status.clone(), bucket.len()))
            .collect()
    }

    /// Number of tasks visible on the board.
    pub fn total(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Tasks whose status is not part of the sequence.
    pub fn excluded(&self) -> &[Task] {
        &self.excluded
    }

    pub fn find(&self, task_id: &str) -> Option<&Task> {
        self.buckets.iter().flatten().find(|t| t.id == task_id)
    }

    pub fn status_of(&self, task_id: &str) -> Option<&TaskStatus> {
        self.find(task_id).map(|t| &t.status)
    }

    /// `(column, row)` of a visible task.
    pub fn position_of(&self, task_id: &str) -> Option<(usize, usize)> {
        self.buckets.iter().enumerate().find_map(|(column, bucket)| {
            bucket
                .iter()
                .position(|t| t.id == task_id)
                .map(|row| (column, row))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(id: &str, status: TaskStatus) -> Task {
        Task::new(id, format!("T{}", id), format!("Task {}", id), status)
    }

    fn short() -> StatusSequence {
        StatusSequence::new(vec![TaskStatus::Open, TaskStatus::S0, TaskStatus::Completed]).unwrap()
    }

    #[test]
    fn test_partition_is_stable() {
        let tasks = vec![
            make_task("a", TaskStatus::S0),
            make_task("b", TaskStatus::Open),
            make_task("c", TaskStatus::S0),
            make_task("d", TaskStatus::S0),
        ];
        let board = TaskBoard::partition(&short(), &tasks);

        let ids: Vec<&str> = board.bucket(&TaskStatus::S0).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
        assert_eq!(board.count(&TaskStatus::Open), 1);
        assert_eq!(board.count(&TaskStatus::Completed), 0);
        assert_eq!(board.total(), 4);
    }

    #[test]
    fn test_every_member_task_in_exactly_one_bucket() {
        let tasks: Vec<Task> = TaskStatus::KNOWN
            .iter()
            .enumerate()
            .map(|(i, s)| make_task(&i.to_string(), s.clone()))
            .collect();
        let board = TaskBoard::partition(&StatusSequence::standard(), &tasks);

        for task in &tasks {
            let hits = board
                .sequence()
                .iter()
                .filter(|s| board.bucket(s).iter().any(|t| t.id == task.id))
                .count();
            assert_eq!(hits, 1, "task {} should be in exactly one bucket", task.id);
        }
        assert!(board.excluded().is_empty());
    }

    #[test]
    fn test_unrecognized_status_is_invisible() {
        let tasks = vec![make_task("y", TaskStatus::parse("Archived"))];
        let board = TaskBoard::partition(&short(), &tasks);

        for (_, count) in board.counts() {
            assert_eq!(count, 0);
        }
        assert_eq!(board.total(), 0);
        assert_eq!(board.find("y"), None);
        assert_eq!(board.excluded().len(), 1);
        assert_eq!(board.excluded()[0].id, "y");
    }

    #[test]
    fn test_known_status_outside_custom_sequence_is_excluded() {
        let tasks = vec![make_task("a", TaskStatus::S3), make_task("b", TaskStatus::Open)];
        let board = TaskBoard::partition(&short(), &tasks);

        assert_eq!(board.total(), 1);
        assert_eq!(board.excluded()[0].id, "a");
        assert!(board.bucket(&TaskStatus::S3).is_empty());
    }

    #[test]
    fn test_lookups() {
        let tasks = vec![
            make_task("a", TaskStatus::Open),
            make_task("b", TaskStatus::Completed),
            make_task("c", TaskStatus::Completed),
        ];
        let board = TaskBoard::partition(&short(), &tasks);

        assert_eq!(board.status_of("b"), Some(&TaskStatus::Completed));
        assert_eq!(board.position_of("c"), Some((2, 1)));
        assert_eq!(board.position_of("missing"), None);
        assert_eq!(board.bucket_at(0).len(), 1);
        assert!(board.bucket_at(9).is_empty());
    }
}
