use std::collections::BTreeMap;

/// Handle for a scheduled frame callback or timer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TaskKind {
    /// Fires once on the next poll.
    Frame,
    /// Fires once when `due_ms` is reached.
    Timeout { due_ms: f64 },
    /// Fires every `period_ms` until cancelled.
    Interval { period_ms: f64, next_due_ms: f64 },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Task {
    pub label: &'static str,
    pub kind: TaskKind,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Fired {
    pub id: TaskId,
    pub label: &'static str,
}

/// Cooperative, single-threaded task table.
///
/// The host pumps `poll` from its animation-frame loop. Cancellation is
/// synchronous: a cancelled task never fires again, even if it was due.
///
/// Ordering contract:
/// - Tasks fired by one `poll` are returned in ascending `TaskId` (creation) order.
/// - Frame requests made while handling a poll fire on the next poll.
#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    tasks: BTreeMap<TaskId, Task>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, label: &'static str, kind: TaskKind) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.tasks.insert(id, Task { label, kind });
        id
    }

    pub fn request_frame(&mut self, label: &'static str) -> TaskId {
        self.insert(label, TaskKind::Frame)
    }

    pub fn set_timeout(&mut self, label: &'static str, delay_ms: f64, now_ms: f64) -> TaskId {
        self.insert(
            label,
            TaskKind::Timeout {
                due_ms: now_ms + delay_ms.max(0.0),
            },
        )
    }

    pub fn set_interval(&mut self, label: &'static str, period_ms: f64, now_ms: f64) -> TaskId {
        let period_ms = period_ms.max(1.0);
        self.insert(
            label,
            TaskKind::Interval {
                period_ms,
                next_due_ms: now_ms + period_ms,
            },
        )
    }

    /// Returns `true` if the task was still pending.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.tasks.remove(&id).is_some()
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn pending_frames(&self) -> usize {
        self.tasks
            .values()
            .filter(|t| matches!(t.kind, TaskKind::Frame))
            .count()
    }

    pub fn pending_with_label(&self, label: &str) -> usize {
        self.tasks.values().filter(|t| t.label == label).count()
    }

    /// Collects every task due at `now_ms`.
    pub fn poll(&mut self, now_ms: f64) -> Vec<Fired> {
        let mut fired = Vec::new();
        let mut finished = Vec::new();

        for (id, task) in self.tasks.iter_mut() {
            match &mut task.kind {
                TaskKind::Frame => {
                    fired.push(Fired {
                        id: *id,
                        label: task.label,
                    });
                    finished.push(*id);
                }
                TaskKind::Timeout { due_ms } => {
                    if now_ms >= *due_ms {
                        fired.push(Fired {
                            id: *id,
                            label: task.label,
                        });
                        finished.push(*id);
                    }
                }
                TaskKind::Interval {
                    period_ms,
                    next_due_ms,
                } => {
                    if now_ms >= *next_due_ms {
                        fired.push(Fired {
                            id: *id,
                            label: task.label,
                        });
                        // Fire at most once per poll; drop missed periods.
                        *next_due_ms += *period_ms;
                        if *next_due_ms <= now_ms {
                            *next_due_ms = now_ms + *period_ms;
                        }
                    }
                }
            }
        }

        for id in finished {
            self.tasks.remove(&id);
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::Scheduler;

    #[test]
    fn frame_requests_fire_once() {
        let mut sched = Scheduler::new();
        let id = sched.request_frame("zoom");
        assert_eq!(sched.pending_frames(), 1);

        let fired = sched.poll(16.0);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].id, id);
        assert!(sched.poll(32.0).is_empty());
        assert!(!sched.is_pending(id));
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let mut sched = Scheduler::new();
        let frame = sched.request_frame("zoom");
        let timer = sched.set_timeout("flash", 10.0, 0.0);
        assert!(sched.cancel(frame));
        assert!(sched.cancel(timer));
        assert!(!sched.cancel(timer));
        assert!(sched.poll(100.0).is_empty());
    }

    #[test]
    fn timeouts_wait_until_due() {
        let mut sched = Scheduler::new();
        sched.set_timeout("flash", 50.0, 100.0);
        assert!(sched.poll(120.0).is_empty());
        assert_eq!(sched.poll(150.0).len(), 1);
        assert!(sched.is_empty());
    }

    #[test]
    fn intervals_repeat_without_catch_up_bursts() {
        let mut sched = Scheduler::new();
        let id = sched.set_interval("autoplay", 100.0, 0.0);
        assert!(sched.poll(50.0).is_empty());
        assert_eq!(sched.poll(100.0).len(), 1);
        // A long stall fires once, not five times.
        assert_eq!(sched.poll(700.0).len(), 1);
        assert!(sched.poll(750.0).is_empty());
        assert_eq!(sched.poll(800.0).len(), 1);
        assert!(sched.is_pending(id));
    }

    #[test]
    fn fires_in_creation_order() {
        let mut sched = Scheduler::new();
        let a = sched.set_timeout("a", 0.0, 0.0);
        let b = sched.request_frame("b");
        let fired = sched.poll(0.0);
        let ids: Vec<_> = fired.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![a, b]);
    }
}
