//! Delayed task queue
//!
//! Every deferred step of the bot (entries, exit checks, retries, refreshes)
//! is a [`Task`] with a deadline. The bot loop sleeps until the earliest
//! deadline and runs due tasks in deadline order, FIFO among equal deadlines.

use crate::signal::{Direction, Signal};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;
use tokio::time::Instant;

/// Deferred bot work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Act on a signal
    Enter(Signal),
    /// Monitor or exit the open position
    Check,
    /// Rediscover instruments and reselect the target
    Refresh { bias: Option<Direction> },
}

#[derive(Debug)]
struct Scheduled {
    deadline: Instant,
    seq: u64,
    task: Task,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Reversed so the max-heap pops the earliest deadline first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Deadline-ordered task queue
#[derive(Debug, Default)]
pub struct TaskQueue {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a task to run after `delay`
    pub fn schedule(&mut self, task: Task, delay: Duration) {
        self.schedule_at(task, Instant::now() + delay);
    }

    /// Schedule a task at an absolute deadline
    pub fn schedule_at(&mut self, task: Task, deadline: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled {
            deadline,
            seq,
            task,
        });
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|s| s.deadline)
    }

    /// Pop the earliest task if it is due at `now`
    pub fn pop_due(&mut self, now: Instant) -> Option<Task> {
        if self.heap.peek()?.deadline <= now {
            self.heap.pop().map(|s| s.task)
        } else {
            None
        }
    }

    /// Keep only the tasks matching the predicate
    pub fn retain(&mut self, mut keep: impl FnMut(&Task) -> bool) {
        self.heap.retain(|s| keep(&s.task));
    }

    pub fn has_entry(&self) -> bool {
        self.heap.iter().any(|s| matches!(s.task, Task::Enter(_)))
    }

    pub fn has_check(&self) -> bool {
        self.heap.iter().any(|s| matches!(s.task, Task::Check))
    }

    pub fn has_refresh(&self) -> bool {
        self.heap.iter().any(|s| matches!(s.task, Task::Refresh { .. }))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_deadline_order() {
        let mut queue = TaskQueue::new();
        let now = Instant::now();

        queue.schedule_at(Task::Check, now + Duration::from_secs(5));
        queue.schedule_at(Task::Refresh { bias: None }, now + Duration::from_secs(1));
        queue.schedule_at(
            Task::Refresh {
                bias: Some(Direction::Up),
            },
            now + Duration::from_secs(3),
        );

        let later = now + Duration::from_secs(10);
        assert_eq!(queue.pop_due(later), Some(Task::Refresh { bias: None }));
        assert_eq!(
            queue.pop_due(later),
            Some(Task::Refresh {
                bias: Some(Direction::Up)
            })
        );
        assert_eq!(queue.pop_due(later), Some(Task::Check));
        assert_eq!(queue.pop_due(later), None);
    }

    #[test]
    fn test_equal_deadlines_are_fifo() {
        let mut queue = TaskQueue::new();
        let deadline = Instant::now();

        queue.schedule_at(Task::Refresh { bias: None }, deadline);
        queue.schedule_at(Task::Check, deadline);

        assert_eq!(queue.pop_due(deadline), Some(Task::Refresh { bias: None }));
        assert_eq!(queue.pop_due(deadline), Some(Task::Check));
    }

    #[test]
    fn test_not_due_yet() {
        let mut queue = TaskQueue::new();
        let now = Instant::now();
        queue.schedule_at(Task::Check, now + Duration::from_millis(2500));

        assert_eq!(queue.pop_due(now), None);
        assert_eq!(queue.next_deadline(), Some(now + Duration::from_millis(2500)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_retain_and_queries() {
        let mut queue = TaskQueue::new();
        queue.schedule(Task::Check, Duration::from_secs(5));
        queue.schedule(Task::Refresh { bias: None }, Duration::ZERO);
        assert!(queue.has_check());
        assert!(queue.has_refresh());
        assert!(!queue.has_entry());

        queue.retain(|t| matches!(t, Task::Check));
        assert!(!queue.has_refresh());
        assert_eq!(queue.len(), 1);

        queue.retain(|_| false);
        assert!(queue.is_empty());
        assert_eq!(queue.next_deadline(), None);
    }
}
