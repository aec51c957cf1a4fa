use core::cell::RefCell;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use portable_atomic::{AtomicU64, Ordering};

/// A generic thread-safe container for Blackboard-style data sharing.
///
/// One thread writes, any number read. Readers always get their own copy, so
/// a value can never be observed half-written.
pub struct DataCell<T: Clone> {
    storage: Mutex<CriticalSectionRawMutex, RefCell<T>>,
    sequence: AtomicU64,
}

impl<T: Clone> DataCell<T> {
    /// Create a new cell with an initial value.
    pub const fn new(init: T) -> Self {
        Self {
            storage: Mutex::new(RefCell::new(init)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Replace the data in the cell (The "Write").
    pub fn update(&self, data: T) {
        self.storage.lock(|cell| {
            *cell.borrow_mut() = data;
        });
        self.sequence.fetch_add(1, Ordering::Release);
    }

    /// Number of updates so far. Unchanged between two reads means no new data.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Fetch a copy of the latest data (The "Read").
    pub fn read(&self) -> T {
        self.storage.lock(|cell| cell.borrow().clone())
    }
}
