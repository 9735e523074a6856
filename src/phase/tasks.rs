//! Cooperative timed tasks
//!
//! Every "wait N seconds, then continue" sequence is a record carrying its
//! resume time and a continuation tag. The simulation drains due tasks once
//! per tick. Tasks are grouped by scope so a phase can cancel its own.

use serde::{Deserialize, Serialize};

use crate::core::types::EntityId;
use crate::phase::state::GamePhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u64);

/// What to do when a task resumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Continuation {
    /// Day timer ran out
    DayElapsed,
    /// Transition window opened from this phase has closed
    TransitionComplete(GamePhase),
    /// Release the next enemy of the active wave
    SpawnNext,
    /// Angry telegraph finished; the villager turns Rebel
    RebellionTelegraph(EntityId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskScope {
    Day,
    Transition,
    Night,
    /// Survives phase changes
    Rebellion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub resume_at: f64,
    pub continuation: Continuation,
    pub scope: TaskScope,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskScheduler {
    tasks: Vec<ScheduledTask>,
    next_id: u64,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, resume_at: f64, continuation: Continuation, scope: TaskScope) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            id,
            resume_at,
            continuation,
            scope,
        });
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Cancel every task in `scope`, returning how many were dropped
    pub fn cancel_scope(&mut self, scope: TaskScope) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.scope != scope);
        let cancelled = before - self.tasks.len();
        if cancelled > 0 {
            tracing::debug!("cancelled {} {:?} tasks", cancelled, scope);
        }
        cancelled
    }

    /// Remove and return every task due at `now`, earliest first
    /// (scheduling order breaks ties).
    pub fn drain_due(&mut self, now: f64) -> Vec<ScheduledTask> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self.tasks.drain(..).partition(|t| t.resume_at <= now);
        self.tasks = pending;
        due.sort_by(|a, b| a.resume_at.total_cmp(&b.resume_at).then(a.id.cmp(&b.id)));
        due
    }

    pub fn pending(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    pub fn has_pending(&self, scope: TaskScope) -> bool {
        self.tasks.iter().any(|t| t.scope == scope)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
