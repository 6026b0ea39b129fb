// core/timers.rs
//
// Delayed actions driven by the frame loop, in place of nested setTimeout
// chains. The queue owns a millisecond clock that only moves on tick().
//
// Usage:
//   let mut timers = TimerQueue::new();
//   let hint = timers.schedule(10_000, Cue::ShowHint);
//   timers.cancel(hint);                 // player moved first
//   for cue in timers.tick(dt_ms) { ... }

/// Handle to a scheduled action for later cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u32);

#[derive(Debug)]
struct Timer<A> {
    id: TimerId,
    due_ms: f64,
    action: A,
}

/// Pending delayed actions of type `A`.
#[derive(Debug)]
pub struct TimerQueue<A> {
    timers: Vec<Timer<A>>,
    now_ms: f64,
    next_id: u32,
}

impl<A> TimerQueue<A> {
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            now_ms: 0.0,
            next_id: 1,
        }
    }

    /// Run `action` once `delay_ms` has elapsed. A zero delay fires on the
    /// next tick.
    pub fn schedule(&mut self, delay_ms: u32, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            due_ms: self.now_ms + delay_ms as f64,
            action,
        });
        id
    }

    /// Drop a pending action. Returns false if it already fired or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.timers.iter().position(|t| t.id == id) {
            Some(idx) => {
                self.timers.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Drop every pending action matching `pred`, returning them.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&A) -> bool) -> Vec<A> {
        let mut removed = Vec::new();
        let mut i = 0;
        while i < self.timers.len() {
            if pred(&self.timers[i].action) {
                removed.push(self.timers.remove(i).action);
            } else {
                i += 1;
            }
        }
        removed
    }

    /// Advance the clock and return the actions that came due, earliest
    /// first; ties fire in scheduling order.
    pub fn tick(&mut self, dt_ms: f64) -> Vec<A> {
        self.now_ms += dt_ms.max(0.0);
        let now = self.now_ms;

        let mut due = Vec::new();
        let mut i = 0;
        while i < self.timers.len() {
            if self.timers[i].due_ms <= now {
                due.push(self.timers.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.id.0.cmp(&b.id.0)));
        due.into_iter().map(|t| t.action).collect()
    }

    /// Milliseconds since the queue was created.
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_delay() {
        let mut q = TimerQueue::new();
        q.schedule(500, "present");
        assert!(q.tick(499.0).is_empty());
        assert_eq!(q.tick(1.0), vec!["present"]);
        assert!(q.is_empty());
    }

    #[test]
    fn fires_in_deadline_order() {
        let mut q = TimerQueue::new();
        q.schedule(300, "c");
        q.schedule(100, "a");
        q.schedule(200, "b");
        q.schedule(100, "a2");
        assert_eq!(q.tick(1000.0), vec!["a", "a2", "b", "c"]);
    }

    #[test]
    fn cancel_prevents_firing() {
        let mut q = TimerQueue::new();
        let hint = q.schedule(10_000, "hint");
        q.schedule(10_000, "other");
        assert!(q.cancel(hint));
        assert!(!q.cancel(hint));
        assert_eq!(q.tick(10_000.0), vec!["other"]);
    }

    #[test]
    fn delays_are_relative_to_schedule_time() {
        let mut q = TimerQueue::new();
        q.tick(1000.0);
        q.schedule(50, 1);
        assert_eq!(q.len(), 1);
        assert!(q.tick(40.0).is_empty());
        assert_eq!(q.tick(10.0), vec![1]);
    }

    #[test]
    fn cancel_where_removes_matching() {
        let mut q = TimerQueue::new();
        q.schedule(10, 1);
        q.schedule(10, 2);
        q.schedule(10, 3);
        let removed = q.cancel_where(|n| n % 2 == 1);
        assert_eq!(removed, vec![1, 3]);
        assert_eq!(q.tick(10.0), vec![2]);
    }
}
