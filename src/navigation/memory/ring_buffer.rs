//! Fixed-capacity ring buffer backing the progress history.

/// A fixed-size circular buffer that overwrites its oldest entry when full.
///
/// Storage is inline, so the navigator state stays allocation-free.
#[derive(Debug, Clone)]
pub struct RingBuffer<T, const N: usize> {
    slots: [T; N],
    head: usize,
    len: usize,
}

impl<T: Default + Copy, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default + Copy, const N: usize> RingBuffer<T, N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [T::default(); N],
            head: 0,
            len: 0,
        }
    }

    /// Capacity of the buffer.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Appends `item`, evicting the oldest entry once `N` are stored.
    pub fn push(&mut self, item: T) {
        if N == 0 {
            return;
        }
        self.slots[self.head] = item;
        self.head = (self.head + 1) % N;
        self.len = (self.len + 1).min(N);
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entry by age: 0 is the oldest retained item.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        let oldest = (self.head + N - self.len) % N;
        Some(&self.slots[(oldest + index) % N])
    }

    /// The most recently pushed entry.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

impl<T: Default + Copy + PartialEq, const N: usize> RingBuffer<T, N> {
    /// How many retained entries equal `item`.
    #[must_use]
    pub fn occurrences(&self, item: &T) -> usize {
        self.iter().filter(|stored| *stored == item).count()
    }
}
