/// Explicit timer queue driving every periodic behaviour of a session.
///
/// Entries are ordered by (fire time, registration id), so two tasks due
/// at the same instant always run in the order they were registered.
/// Time only moves when the owner calls `pop_due` / `advance_to`; there
/// is no wall clock in here, which is what lets tests step time by hand.
///
/// `cancel_all` is terminal: the queue is emptied and later
/// registrations are ignored.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TaskId(u64);

struct Entry<T> {
    fire_at: Duration,
    id: TaskId,
    period: Option<Duration>,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.id == other.id
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // BinaryHeap is a max-heap; reverse so the earliest entry is on top.
    fn cmp(&self, other: &Self) -> Ordering {
        other.fire_at.cmp(&self.fire_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}

pub struct Scheduler<T> {
    now: Duration,
    queue: BinaryHeap<Entry<T>>,
    next_id: u64,
    stopped: bool,
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Scheduler { now: Duration::ZERO, queue: BinaryHeap::new(), next_id: 0, stopped: false }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Run `task` every `period`, first one `period` from now.
    pub fn register_periodic(&mut self, period: Duration, task: T) -> TaskId {
        // A zero period would pin the clock in place.
        let period = period.max(Duration::from_micros(1));
        self.push(period, Some(period), task)
    }

    /// Run `task` once, `delay` from now.
    pub fn register_one_shot(&mut self, delay: Duration, task: T) -> TaskId {
        self.push(delay, None, task)
    }

    fn push(&mut self, delay: Duration, period: Option<Duration>, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        if !self.stopped {
            self.queue.push(Entry { fire_at: self.now + delay, id, period, task });
        }
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|e| e.id != id);
        self.queue.len() != before
    }

    /// Cancel every entry whose task matches. Returns how many went.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.queue.len();
        self.queue.retain(|e| !pred(&e.task));
        before - self.queue.len()
    }

    /// Drop everything and refuse new registrations. Idempotent.
    pub fn cancel_all(&mut self) {
        self.queue.clear();
        self.stopped = true;
    }

    /// Pop the next task due at or before `until`, moving the clock to its
    /// fire time. Periodic tasks are re-queued one period later.
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        if self.stopped {
            return None;
        }
        if self.queue.peek().map_or(true, |e| e.fire_at > until) {
            return None;
        }
        let mut entry = self.queue.pop()?;
        self.now = self.now.max(entry.fire_at);
        let task = entry.task.clone();
        if let Some(period) = entry.period {
            entry.fire_at += period;
            self.queue.push(entry);
        }
        Some(task)
    }

    /// Move the clock forward once nothing else is due.
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Scheduler::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn drain(s: &mut Scheduler<&'static str>, until: Duration) -> Vec<(u64, &'static str)> {
        let mut out = vec![];
        while let Some(t) = s.pop_due(until) {
            out.push((s.now().as_millis() as u64, t));
        }
        s.advance_to(until);
        out
    }

    #[test]
    fn independent_cadences_interleave() {
        let mut s = Scheduler::new();
        s.register_periodic(ms(40), "physics");
        s.register_periodic(ms(100), "anim");
        let fired = drain(&mut s, ms(200));
        assert_eq!(fired, vec![
            (40, "physics"), (80, "physics"), (100, "anim"), (120, "physics"),
            (160, "physics"), (200, "physics"), (200, "anim"),
        ]);
        assert_eq!(s.now(), ms(200));
    }

    #[test]
    fn one_shot_fires_once() {
        let mut s = Scheduler::new();
        s.register_one_shot(ms(500), "lose");
        assert!(drain(&mut s, ms(499)).is_empty());
        assert_eq!(drain(&mut s, ms(2000)), vec![(500, "lose")]);
        assert!(s.is_empty());
    }

    #[test]
    fn registrations_are_relative_to_current_time() {
        let mut s = Scheduler::new();
        drain(&mut s, ms(1000));
        s.register_one_shot(ms(700), "win");
        assert_eq!(drain(&mut s, ms(1700)), vec![(1700, "win")]);
    }

    #[test]
    fn cancel_by_id_and_predicate() {
        let mut s = Scheduler::new();
        let a = s.register_periodic(ms(10), "a");
        s.register_periodic(ms(10), "b1");
        s.register_periodic(ms(10), "b2");
        assert!(s.cancel(a));
        assert!(!s.cancel(a));
        assert_eq!(s.cancel_where(|t| t.starts_with('b')), 2);
        assert!(drain(&mut s, ms(100)).is_empty());
    }

    #[test]
    fn cancel_all_is_terminal() {
        let mut s = Scheduler::new();
        s.register_periodic(ms(10), "tick");
        s.cancel_all();
        s.cancel_all();
        s.register_one_shot(ms(1), "late");
        assert!(s.is_stopped());
        assert!(s.is_empty());
        assert!(drain(&mut s, ms(1000)).is_empty());
    }

    #[test]
    fn zero_period_still_advances() {
        let mut s = Scheduler::new();
        s.register_periodic(Duration::ZERO, "spin");
        let fired = drain(&mut s, Duration::from_micros(3));
        assert_eq!(fired.len(), 3);
    }
}
