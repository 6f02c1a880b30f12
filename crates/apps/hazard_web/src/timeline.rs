use foundation::time::YearRange;
use runtime::{Scheduler, TaskId};

pub const TIMELINE_TASK_LABEL: &str = "timeline.tick";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Playback {
    Stopped,
    Playing { task: TaskId },
}

/// Selected year plus the autoplay state machine.
#[derive(Debug, Clone)]
pub struct Timeline {
    range: YearRange,
    current: i32,
    playback: Playback,
    budget_ms: f64,
}

impl Timeline {
    pub fn new(range: YearRange, budget_ms: f64) -> Self {
        Self {
            range,
            current: range.min,
            playback: Playback::Stopped,
            budget_ms: budget_ms.max(0.0),
        }
    }

    pub fn range(&self) -> YearRange {
        self.range
    }

    pub fn current_year(&self) -> i32 {
        self.current
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.playback, Playback::Playing { .. })
    }

    /// One full pass over the range takes the configured budget.
    pub fn interval_ms(&self) -> f64 {
        self.budget_ms / self.range.len() as f64
    }

    /// Slider input. Rejected while playing; returns the new year if it
    /// changed.
    pub fn set_year(&mut self, year: i32) -> Option<i32> {
        if self.is_playing() {
            tracing::debug!("ignoring slider input while autoplay runs");
            return None;
        }
        let year = self.range.clamp(year);
        if year == self.current {
            return None;
        }
        self.current = year;
        Some(year)
    }

    /// Starts autoplay. From the last year, playback restarts at the first.
    pub fn play(&mut self, now_ms: f64, scheduler: &mut Scheduler) -> bool {
        if self.is_playing() {
            return false;
        }
        if self.current >= self.range.max {
            self.current = self.range.min;
        }
        let task = scheduler.set_interval(TIMELINE_TASK_LABEL, self.interval_ms(), now_ms);
        self.playback = Playback::Playing { task };
        true
    }

    pub fn pause(&mut self, scheduler: &mut Scheduler) -> bool {
        match self.playback {
            Playback::Playing { task } => {
                scheduler.cancel(task);
                self.playback = Playback::Stopped;
                true
            }
            Playback::Stopped => false,
        }
    }

    /// Advances one year on our interval task. Stops on reaching the last
    /// year. Returns the new year.
    pub fn on_tick(&mut self, task: TaskId, scheduler: &mut Scheduler) -> Option<i32> {
        let Playback::Playing { task: ours } = self.playback else {
            return None;
        };
        if ours != task {
            return None;
        }
        self.current = (self.current + 1).min(self.range.max);
        if self.current >= self.range.max {
            self.pause(scheduler);
        }
        Some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::{Playback, TIMELINE_TASK_LABEL, Timeline};
    use foundation::time::YearRange;
    use pretty_assertions::assert_eq;
    use runtime::Scheduler;

    #[test]
    fn autoplay_runs_to_the_end_and_stops() {
        let mut sched = Scheduler::new();
        let mut tl = Timeline::new(YearRange::new(2000, 2003), 400.0);
        assert_eq!(tl.interval_ms(), 100.0);
        assert!(tl.play(0.0, &mut sched));

        let mut years = Vec::new();
        let mut now = 0.0;
        while tl.is_playing() {
            now += 100.0;
            for fired in sched.poll(now) {
                years.extend(tl.on_tick(fired.id, &mut sched));
            }
        }
        assert_eq!(years, vec![2001, 2002, 2003]);
        assert_eq!(tl.playback(), Playback::Stopped);
        assert_eq!(sched.pending_with_label(TIMELINE_TASK_LABEL), 0);
    }

    #[test]
    fn slider_rejected_while_playing() {
        let mut sched = Scheduler::new();
        let mut tl = Timeline::new(YearRange::new(2000, 2010), 1000.0);
        assert_eq!(tl.set_year(2005), Some(2005));
        assert_eq!(tl.set_year(2005), None);
        tl.play(0.0, &mut sched);
        assert_eq!(tl.set_year(2001), None);
        assert_eq!(tl.current_year(), 2005);

        assert!(tl.pause(&mut sched));
        assert!(sched.is_empty());
        assert_eq!(tl.set_year(1990), Some(2000));
    }

    #[test]
    fn play_from_last_year_restarts() {
        let mut sched = Scheduler::new();
        let mut tl = Timeline::new(YearRange::new(2000, 2002), 300.0);
        tl.set_year(2002);
        tl.play(0.0, &mut sched);
        assert_eq!(tl.current_year(), 2000);
    }
}
