// Timer Queue
// Handles scheduling, cancellation and firing of millisecond timers

use super::Millis;

/// Handle to a scheduled timer
///
/// Handles are unique within the queue that issued them and are never reused,
/// so a stale handle can be cancelled safely: it simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A pending timer
#[derive(Debug, Clone)]
struct Timer<E> {
    id: TimerId,
    /// Time at which the timer becomes due
    due: Millis,
    payload: E,
}

/// Ordered collection of pending timers
///
/// Timers are kept sorted by due time; timers due at the same instant fire
/// in the order they were scheduled.
#[derive(Debug)]
pub struct TimerQueue<E> {
    timers: Vec<Timer<E>>,
    next_id: u64,
}

impl<E> TimerQueue<E> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 0,
        }
    }

    /// Schedule `payload` to become due at `due`
    pub fn schedule_at(&mut self, due: Millis, payload: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        // Insert after every timer due at or before `due` to keep FIFO order
        // among equal deadlines.
        let pos = self
            .timers
            .iter()
            .position(|t| t.due > due)
            .unwrap_or(self.timers.len());
        self.timers.insert(pos, Timer { id, due, payload });
        id
    }

    /// Schedule `payload` to become due `delay` milliseconds after `now`
    pub fn schedule_after(&mut self, now: Millis, delay: Millis, payload: E) -> TimerId {
        self.schedule_at(now.saturating_add(delay), payload)
    }

    /// Cancel a timer, returning its payload if it was still pending
    pub fn cancel(&mut self, id: TimerId) -> Option<E> {
        let pos = self.timers.iter().position(|t| t.id == id)?;
        Some(self.timers.remove(pos).payload)
    }

    /// Check if a timer is still pending
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    /// Due time of a pending timer
    pub fn due_of(&self, id: TimerId) -> Option<Millis> {
        self.timers.iter().find(|t| t.id == id).map(|t| t.due)
    }

    /// Earliest due time among pending timers
    pub fn next_due(&self) -> Option<Millis> {
        self.timers.first().map(|t| t.due)
    }

    /// Remove and return every timer due at or before `now`, in firing order
    ///
    /// Only timers pending at the time of the call are returned. Timers the
    /// caller schedules while handling the result wait for the next call,
    /// even when they are already due.
    pub fn take_due(&mut self, now: Millis) -> Vec<(TimerId, E)> {
        let split = self
            .timers
            .iter()
            .position(|t| t.due > now)
            .unwrap_or(self.timers.len());
        self.timers
            .drain(..split)
            .map(|t| (t.id, t.payload))
            .collect()
    }

    /// Drop all pending timers
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Iterate over pending payloads in firing order
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.timers.iter().map(|t| &t.payload)
    }
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_queue_new() {
        let queue: TimerQueue<u8> = TimerQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.next_due(), None);
    }

    #[test]
    fn test_schedule_orders_by_due_time() {
        let mut queue = TimerQueue::new();
        queue.schedule_at(300, 'c');
        queue.schedule_at(100, 'a');
        queue.schedule_at(200, 'b');

        let order: Vec<_> = queue.iter().copied().collect();
        assert_eq!(order, vec!['a', 'b', 'c']);
        assert_eq!(queue.next_due(), Some(100));
    }

    #[test]
    fn test_equal_deadlines_fire_in_schedule_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_at(50, 1);
        queue.schedule_at(50, 2);
        queue.schedule_at(10, 0);
        queue.schedule_at(50, 3);

        let fired: Vec<_> = queue.take_due(50).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_schedule_after_saturates() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule_after(u64::MAX - 1, 10, ());
        assert_eq!(queue.due_of(id), Some(u64::MAX));
    }

    #[test]
    fn test_cancel() {
        let mut queue = TimerQueue::new();
        let a = queue.schedule_at(10, "a");
        let b = queue.schedule_at(20, "b");

        assert_eq!(queue.cancel(a), Some("a"));
        assert!(!queue.is_pending(a));
        assert!(queue.is_pending(b));

        // Cancelling twice matches nothing
        assert_eq!(queue.cancel(a), None);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_take_due_leaves_future_timers() {
        let mut queue = TimerQueue::new();
        queue.schedule_at(10, "early");
        queue.schedule_at(20, "on-time");
        queue.schedule_at(30, "late");

        let fired: Vec<_> = queue.take_due(20).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec!["early", "on-time"]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_due(), Some(30));
    }

    #[test]
    fn test_take_due_ignores_timers_added_afterwards() {
        let mut queue = TimerQueue::new();
        queue.schedule_at(0, 0u32);

        let fired = queue.take_due(0);
        assert_eq!(fired.len(), 1);

        // A zero-delay reschedule is due, but only shows up on the next call
        queue.schedule_after(0, 0, 1u32);
        let fired: Vec<_> = queue.take_due(0).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec![1]);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut queue = TimerQueue::new();
        let a = queue.schedule_at(0, ());
        let b = queue.schedule_at(0, ());
        queue.clear();
        let c = queue.schedule_at(0, ());

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert!(c.raw() > b.raw());
    }
}
