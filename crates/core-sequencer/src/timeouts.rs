use alloc::collections::{BTreeSet, BinaryHeap};
use core::cmp::{Ordering, Reverse};

use roundfsm_core_types::Timestamp;

/// Handle to a scheduled timeout, used to cancel it.
pub type TimeoutId = u64;

#[derive(Clone, Debug)]
struct Entry<E> {
    deadline: Timestamp,
    id: TimeoutId,
    event: E,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.deadline, self.id).cmp(&(other.deadline, other.id))
    }
}

/// A priority queue of deadlines, ordered by deadline then by scheduling order.
///
/// Cancelled entries stay in the queue until they reach the front.
#[derive(Clone, Debug)]
pub struct Timeouts<E> {
    queue: BinaryHeap<Reverse<Entry<E>>>,
    live: BTreeSet<TimeoutId>,
    next_id: TimeoutId,
}

impl<E> Default for Timeouts<E> {
    fn default() -> Self {
        Self {
            queue: BinaryHeap::new(),
            live: BTreeSet::new(),
            next_id: 0,
        }
    }
}

impl<E> Timeouts<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of scheduled timeouts that are not cancelled.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Schedule `event` to fire at `deadline`.
    pub fn add(&mut self, deadline: Timestamp, event: E) -> TimeoutId {
        let id = self.next_id;
        self.next_id += 1;

        self.live.insert(id);
        self.queue.push(Reverse(Entry {
            deadline,
            id,
            event,
        }));

        id
    }

    /// Cancel a scheduled timeout. Cancelling a fired or unknown timeout does nothing.
    pub fn cancel(&mut self, id: TimeoutId) {
        self.live.remove(&id);
    }

    /// The earliest deadline that is not cancelled.
    pub fn earliest(&mut self) -> Option<(Timestamp, &E)> {
        self.drop_cancelled();
        self.queue
            .peek()
            .map(|Reverse(entry)| (entry.deadline, &entry.event))
    }

    /// Remove and return the earliest timeout if its deadline is at or before `now`.
    pub fn pop_expired(&mut self, now: Timestamp) -> Option<(Timestamp, E)> {
        self.drop_cancelled();

        match self.queue.peek() {
            Some(Reverse(entry)) if entry.deadline <= now => {}
            _ => return None,
        }

        let Reverse(entry) = self.queue.pop()?;
        self.live.remove(&entry.id);
        Some((entry.deadline, entry.event))
    }

    fn drop_cancelled(&mut self) {
        while let Some(Reverse(entry)) = self.queue.peek() {
            if self.live.contains(&entry.id) {
                break;
            }
            self.queue.pop();
        }
    }
}
