//! Virtual-clock timer queue.
//!
//! Every delayed action of the dock (leave demands, hide-back, delayed
//! unhide, sub-dock show, animation frames) goes through a [`TimerQueue`].
//! Handles are never reused, so a cancelled or already fired handle can be
//! told apart from a live one. A [`TimerSlot`] holds at most one pending
//! handle and always cancels the previous one before scheduling again.

/// Milliseconds on the queue's clock.
pub type Millis = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct PendingTimer<T> {
    handle: TimerHandle,
    deadline: Millis,
    payload: T,
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    now: Millis,
    next_id: u64,
    pending: Vec<PendingTimer<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 1,
            pending: Vec::new(),
        }
    }

    // === Getters ===

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|t| t.handle == handle)
    }

    pub fn deadline(&self, handle: TimerHandle) -> Option<Millis> {
        self.pending
            .iter()
            .find(|t| t.handle == handle)
            .map(|t| t.deadline)
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.pending.iter().map(|t| t.deadline).min()
    }

    pub fn payloads(&self) -> impl Iterator<Item = &T> {
        self.pending.iter().map(|t| &t.payload)
    }

    // === State Mutations ===

    pub fn schedule(&mut self, delay: Millis, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(PendingTimer {
            handle,
            deadline: self.now.saturating_add(delay),
            payload,
        });
        handle
    }

    /// Returns false when the handle already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.handle != handle);
        before != self.pending.len()
    }

    /// Drops every pending timer whose payload matches.
    pub fn cancel_where(&mut self, mut matches: impl FnMut(&T) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|t| !matches(&t.payload));
        before - self.pending.len()
    }

    /// Pops the earliest timer due at or before `until` and moves the clock
    /// to its deadline. Ties fire in scheduling order.
    pub fn pop_due(&mut self, until: Millis) -> Option<(TimerHandle, T)> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= until)
            .min_by_key(|(_, t)| (t.deadline, t.handle))
            .map(|(index, _)| index)?;
        let timer = self.pending.swap_remove(index);
        self.now = self.now.max(timer.deadline);
        Some((timer.handle, timer.payload))
    }

    /// Moves the clock forward without firing anything.
    pub fn advance_clock(&mut self, to: Millis) {
        self.now = self.now.max(to);
    }
}

/// Holder for one logical timer: at most one callback pending at a time.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TimerSlot(Option<TimerHandle>);

impl TimerSlot {
    pub fn handle(&self) -> Option<TimerHandle> {
        self.0
    }

    pub fn is_pending<T>(&self, queue: &TimerQueue<T>) -> bool {
        self.0.is_some_and(|handle| queue.is_pending(handle))
    }

    pub fn schedule<T>(&mut self, queue: &mut TimerQueue<T>, delay: Millis, payload: T) -> TimerHandle {
        self.cancel(queue);
        let handle = queue.schedule(delay, payload);
        self.0 = Some(handle);
        handle
    }

    pub fn cancel<T>(&mut self, queue: &mut TimerQueue<T>) -> bool {
        match self.0.take() {
            Some(handle) => queue.cancel(handle),
            None => false,
        }
    }

    /// Clears the slot if `handle` is the one it holds. A false return means
    /// the firing timer is stale and must be ignored.
    pub fn fired(&mut self, handle: TimerHandle) -> bool {
        if self.0 == Some(handle) {
            self.0 = None;
            true
        } else {
            false
        }
    }
}
