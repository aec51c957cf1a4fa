// health_types.rs
use portable_atomic::{AtomicU32, Ordering};

/// Running counters for the link, shared by every activity on one side.
#[derive(Default)]
pub struct LinkHealth {
    frames_ingested: AtomicU32,
    parse_errors: AtomicU32,
    packets_sent: AtomicU32,
    send_failures: AtomicU32,
    rows_flushed: AtomicU32,
}

/// Plain copy of [`LinkHealth`] for reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkHealthReport {
    pub frames_ingested: u32,
    pub parse_errors: u32,
    pub packets_sent: u32,
    pub send_failures: u32,
    pub rows_flushed: u32,
}

impl LinkHealth {
    pub const fn new() -> Self {
        Self {
            frames_ingested: AtomicU32::new(0),
            parse_errors: AtomicU32::new(0),
            packets_sent: AtomicU32::new(0),
            send_failures: AtomicU32::new(0),
            rows_flushed: AtomicU32::new(0),
        }
    }

    pub fn record_frame(&self) {
        self.frames_ingested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send(&self, delivered: bool) {
        if delivered {
            self.packets_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.send_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_flush(&self, rows: usize) {
        self.rows_flushed
            .fetch_add(u32::try_from(rows).unwrap_or(u32::MAX), Ordering::Relaxed);
    }

    pub fn capture(&self) -> LinkHealthReport {
        LinkHealthReport {
            frames_ingested: self.frames_ingested.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            rows_flushed: self.rows_flushed.load(Ordering::Relaxed),
        }
    }
}
