//! Deferred work for a drill session.
//!
//! Opponent replies and status-line hiding happen a short while after the move
//! that triggers them. Tasks carry a logical due time instead of owning a timer,
//! so the session decides when time passes (`advance`) and tests can run every
//! pending task at once (`drain`).

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    OpponentReply,
    HideStatus,
}

/// Snapshot of the queue generation. Once the queue is cancelled every token
/// taken before reports cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelToken(u64);

#[derive(Debug, Clone)]
struct Scheduled {
    id: TaskId,
    kind: TaskKind,
    due_at: Duration,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct TaskQueue {
    now: Duration,
    next_id: u64,
    generation: u64,
    pending: Vec<Scheduled>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical time elapsed since the queue was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn has_pending(&self, kind: TaskKind) -> bool {
        self.pending.iter().any(|t| t.kind == kind)
    }

    pub fn token(&self) -> CancelToken {
        CancelToken(self.generation)
    }

    pub fn is_cancelled(&self, token: CancelToken) -> bool {
        token.0 != self.generation
    }

    pub fn schedule(&mut self, kind: TaskKind, delay: Duration) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled {
            id,
            kind,
            due_at: self.now + delay,
            generation: self.generation,
        });
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    pub fn cancel_kind(&mut self, kind: TaskKind) {
        self.pending.retain(|t| t.kind != kind);
    }

    /// Drops every pending task and invalidates outstanding tokens.
    pub fn cancel_all(&mut self) {
        self.generation += 1;
        self.pending.clear();
    }

    /// Moves logical time forward and returns the tasks now due, oldest first.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<(TaskId, TaskKind)> {
        self.now += elapsed;
        let now = self.now;
        self.take_where(|t| t.due_at <= now)
    }

    /// Returns every pending task in due order, jumping time to the last one.
    pub fn drain(&mut self) -> Vec<(TaskId, TaskKind)> {
        if let Some(last) = self.pending.iter().map(|t| t.due_at).max() {
            self.now = self.now.max(last);
        }
        self.take_where(|_| true)
    }

    /// Takes every pending task of `kind` in due order, jumping time to the
    /// last one. Tasks of other kinds keep their due times.
    pub fn drain_kind(&mut self, kind: TaskKind) -> Vec<(TaskId, TaskKind)> {
        if let Some(last) = self
            .pending
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.due_at)
            .max()
        {
            self.now = self.now.max(last);
        }
        self.take_where(|t| t.kind == kind)
    }

    fn take_where(&mut self, due: impl Fn(&Scheduled) -> bool) -> Vec<(TaskId, TaskKind)> {
        let generation = self.generation;
        let (mut ready, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|t| due(t));
        self.pending = waiting;
        ready.retain(|t| t.generation == generation);
        ready.sort_by_key(|t| (t.due_at, t.id));
        ready.into_iter().map(|t| (t.id, t.kind)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn tasks_fire_once_due() {
        let mut queue = TaskQueue::new();
        let reply = queue.schedule(TaskKind::OpponentReply, ms(500));
        let hide = queue.schedule(TaskKind::HideStatus, ms(3000));

        assert!(queue.advance(ms(499)).is_empty());
        assert_eq!(queue.advance(ms(1)), vec![(reply, TaskKind::OpponentReply)]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.advance(ms(5000)), vec![(hide, TaskKind::HideStatus)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_runs_everything_in_due_order() {
        let mut queue = TaskQueue::new();
        let late = queue.schedule(TaskKind::HideStatus, ms(2000));
        let early = queue.schedule(TaskKind::OpponentReply, ms(300));
        let fired: Vec<_> = queue.drain().into_iter().map(|(id, _)| id).collect();
        assert_eq!(fired, vec![early, late]);
        assert_eq!(queue.now(), ms(2000));
    }

    #[test]
    fn drain_kind_keeps_other_deadlines() {
        let mut queue = TaskQueue::new();
        let hide = queue.schedule(TaskKind::HideStatus, ms(3000));
        queue.advance(ms(1000));
        let reply = queue.schedule(TaskKind::OpponentReply, ms(500));

        assert_eq!(
            queue.drain_kind(TaskKind::OpponentReply),
            vec![(reply, TaskKind::OpponentReply)]
        );
        assert_eq!(queue.now(), ms(1500));
        assert!(queue.advance(ms(1499)).is_empty());
        assert_eq!(queue.advance(ms(1)), vec![(hide, TaskKind::HideStatus)]);
    }

    #[test]
    fn cancel_single_and_by_kind() {
        let mut queue = TaskQueue::new();
        let a = queue.schedule(TaskKind::HideStatus, ms(10));
        queue.schedule(TaskKind::HideStatus, ms(20));
        queue.schedule(TaskKind::OpponentReply, ms(30));

        assert!(queue.cancel(a));
        assert!(!queue.cancel(a));
        queue.cancel_kind(TaskKind::HideStatus);
        assert!(!queue.has_pending(TaskKind::HideStatus));
        assert!(queue.has_pending(TaskKind::OpponentReply));
    }

    #[test]
    fn cancel_all_invalidates_tokens() {
        let mut queue = TaskQueue::new();
        let token = queue.token();
        queue.schedule(TaskKind::OpponentReply, ms(500));

        queue.cancel_all();
        assert!(queue.is_cancelled(token));
        assert!(queue.drain().is_empty());
        assert!(!queue.is_cancelled(queue.token()));
    }
}
