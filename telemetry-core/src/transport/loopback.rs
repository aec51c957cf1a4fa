//! In-memory radio pair for tests and the simulator.

use crate::transport::RadioDriver;
use core::cell::{Cell, RefCell};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use portable_atomic::{AtomicBool, Ordering};
use std::collections::VecDeque;
use std::sync::Arc;

struct Endpoint {
    inbox: Mutex<CriticalSectionRawMutex, RefCell<VecDeque<Vec<u8>>>>,
    listening: AtomicBool,
}

impl Endpoint {
    fn new() -> Self {
        Self {
            inbox: Mutex::new(RefCell::new(VecDeque::new())),
            listening: AtomicBool::new(false),
        }
    }
}

/// One end of a simulated half-duplex radio channel.
///
/// Frames reach the peer only while the peer is listening, like the real
/// hardware. Transmitting while still in listening mode is refused.
pub struct LoopbackRadio {
    local: Arc<Endpoint>,
    peer: Arc<Endpoint>,
    sent: RefCell<Vec<Vec<u8>>>,
    writes: Cell<usize>,
    fail_on: Cell<Option<usize>>,
}

impl LoopbackRadio {
    /// Two connected ends.
    pub fn pair() -> (Self, Self) {
        let a = Arc::new(Endpoint::new());
        let b = Arc::new(Endpoint::new());
        (Self::new(a.clone(), b.clone()), Self::new(b, a))
    }

    fn new(local: Arc<Endpoint>, peer: Arc<Endpoint>) -> Self {
        Self {
            local,
            peer,
            sent: RefCell::new(Vec::new()),
            writes: Cell::new(0),
            fail_on: Cell::new(None),
        }
    }

    /// Every frame this end has put on the air, in order.
    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.sent.borrow().clone()
    }

    pub fn is_listening(&self) -> bool {
        self.local.listening.load(Ordering::Acquire)
    }

    /// Makes the `n`-th write from now (1-based) report failure.
    pub fn fail_nth_write(&self, n: usize) {
        self.fail_on.set(Some(self.writes.get() + n));
    }
}

impl RadioDriver for LoopbackRadio {
    fn start_listening(&mut self) {
        self.local.listening.store(true, Ordering::Release);
    }

    fn stop_listening(&mut self) {
        self.local.listening.store(false, Ordering::Release);
    }

    fn write_frame(&mut self, frame: &[u8]) -> bool {
        if self.is_listening() {
            log::warn!("Radio asked to transmit while listening");
            return false;
        }
        self.writes.set(self.writes.get() + 1);
        if self.fail_on.get() == Some(self.writes.get()) {
            self.fail_on.set(None);
            return false;
        }

        self.sent.borrow_mut().push(frame.to_vec());
        if self.peer.listening.load(Ordering::Acquire) {
            self.peer
                .inbox
                .lock(|inbox| inbox.borrow_mut().push_back(frame.to_vec()));
        } else {
            log::debug!("Peer not listening, frame lost");
        }
        true
    }

    fn read_frame(&mut self) -> Option<Vec<u8>> {
        self.local.inbox.lock(|inbox| inbox.borrow_mut().pop_front())
    }
}
