use foundation::time::Millis;

/// Deterministic timer queue for the cooperative event loop.
///
/// Each timer carries a key. Scheduling with a key that is already pending
/// replaces the earlier timer, which is how debouncing and "at most one
/// pending continuation per concern" are expressed.
///
/// Firing order is `(due_time, insertion_order)`, so timers that fall due in
/// the same tick run in the order they were scheduled.
#[derive(Debug)]
pub struct TimerQueue<K, T> {
    next_order: u64,
    timers: Vec<Timer<K, T>>,
}

#[derive(Debug)]
struct Timer<K, T> {
    due: Millis,
    order: u64,
    key: K,
    task: T,
}

impl<K, T> Default for TimerQueue<K, T> {
    fn default() -> Self {
        Self {
            next_order: 0,
            timers: Vec::new(),
        }
    }
}

impl<K: PartialEq, T> TimerQueue<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to run `delay_ms` after `now`, replacing any pending
    /// timer with the same key.
    ///
    /// Returns `true` if an earlier timer was superseded.
    pub fn schedule(&mut self, now: Millis, delay_ms: u64, key: K, task: T) -> bool {
        let superseded = self.cancel(&key);
        let order = self.next_order;
        self.next_order = self.next_order.wrapping_add(1);
        self.timers.push(Timer {
            due: now.after(delay_ms),
            order,
            key,
            task,
        });
        superseded
    }

    /// Drop the pending timer for `key`, if any.
    pub fn cancel(&mut self, key: &K) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| &t.key != key);
        self.timers.len() != before
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.timers.iter().any(|t| &t.key == key)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Earliest due time, for hosts that arm a single native timer.
    pub fn next_due(&self) -> Option<Millis> {
        self.timers.iter().map(|t| t.due).min()
    }

    /// Remove and return every task due at or before `now`, in firing order.
    pub fn take_due(&mut self, now: Millis) -> Vec<(K, T)> {
        let mut due = Vec::new();
        let mut keep = Vec::with_capacity(self.timers.len());
        for timer in self.timers.drain(..) {
            if timer.due <= now {
                due.push(timer);
            } else {
                keep.push(timer);
            }
        }
        self.timers = keep;
        due.sort_by(|a, b| a.due.cmp(&b.due).then_with(|| a.order.cmp(&b.order)));
        due.into_iter().map(|t| (t.key, t.task)).collect()
    }
}
