//! Fixed-capacity circular buffer
//!
//! Plain ring storage with a write cursor, a read cursor and an occupied
//! count. It does no locking of its own; the [`Coordinator`] owns one inside
//! its mutex and layers blocking on top.
//!
//! [`Coordinator`]: crate::pipeline::Coordinator

/// Circular array of slots
///
/// Invariants: `0 <= occupied <= capacity`, both cursors advance modulo
/// capacity, and the item written Nth is the item read Nth.
#[derive(Debug)]
pub struct BoundedBuffer<T> {
    /// Slot storage; `None` marks a free slot
    slots: Vec<Option<T>>,

    /// Next slot to fill
    write: usize,

    /// Next slot to drain
    read: usize,

    /// Filled slots
    occupied: usize,
}

impl<T> BoundedBuffer<T> {
    /// Create an empty buffer
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Configuration validation rejects that
    /// before a buffer is ever built.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be at least 1");

        Self {
            slots: (0..capacity).map(|_| None).collect(),
            write: 0,
            read: 0,
            occupied: 0,
        }
    }

    /// Fill the slot at the write cursor
    ///
    /// Hands the item back if every slot is occupied.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }

        debug_assert!(self.slots[self.write].is_none());
        self.slots[self.write] = Some(item);
        self.write = (self.write + 1) % self.slots.len();
        self.occupied += 1;
        Ok(())
    }

    /// Drain the slot at the read cursor
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let item = self.slots[self.read].take();
        debug_assert!(item.is_some());
        self.read = (self.read + 1) % self.slots.len();
        self.occupied -= 1;
        item
    }

    pub fn len(&self) -> usize {
        self.occupied
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    pub fn is_full(&self) -> bool {
        self.occupied == self.slots.len()
    }

    /// Index of the next slot to fill
    pub fn write_cursor(&self) -> usize {
        self.write
    }

    /// Index of the next slot to drain
    pub fn read_cursor(&self) -> usize {
        self.read
    }
}
