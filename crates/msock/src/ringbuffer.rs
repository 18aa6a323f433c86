use std::sync::{Condvar, Mutex};

use msock_utils::safe_assert;

/// Bounded byte FIFO with blocking read/write and a sticky close signal.
///
/// One slot of the backing array is always kept empty so that `head == tail`
/// can mean "empty" unambiguously; usable capacity is therefore `capacity - 1`
/// bytes. A single [`Condvar`] wakes both readers and writers on any state
/// change (`head`, `tail`, or `closed`).
pub struct RingBuffer {
    inner: Mutex<Inner>,
    cv: Condvar,
}

struct Inner {
    data: Box<[u8]>,
    head: usize,
    tail: usize,
    closed: bool,
}

impl Inner {
    #[inline]
    fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    #[inline]
    fn is_full(&self) -> bool {
        (self.tail + 1) % self.data.len() == self.head
    }

    #[inline]
    fn used(&self) -> usize {
        if self.tail >= self.head {
            self.tail - self.head
        } else {
            self.data.len() - self.head + self.tail
        }
    }

    #[inline]
    fn avail(&self) -> usize {
        self.data.len() - 1 - self.used()
    }
}

impl RingBuffer {
    /// Creates a buffer with the given total capacity. Capacity must be at
    /// least 2 — one slot is reserved to disambiguate empty from full, so a
    /// capacity of 1 could never hold a byte.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "RingBuffer capacity must be at least 2, got {capacity}");
        Self {
            inner: Mutex::new(Inner {
                data: vec![0u8; capacity].into_boxed_slice(),
                head: 0,
                tail: 0,
                closed: false,
            }),
            cv: Condvar::new(),
        }
    }

    /// Writes as many bytes of `data` as fit without blocking past a single
    /// wait, returning how many were actually written. Blocks while the
    /// buffer is full and open; returns 0 immediately if closed.
    pub fn write(&self, data: &[u8]) -> usize {
        let mut inner = self.inner.lock().unwrap();
        inner = self.cv.wait_while(inner, |i| i.is_full() && !i.closed).unwrap();

        if inner.closed {
            return 0;
        }

        let to_write = data.len().min(inner.avail());
        if to_write == 0 {
            return 0;
        }

        let len = inner.data.len();
        let tail = inner.tail;
        let first = to_write.min(len - tail);
        let rest = to_write - first;

        inner.data[tail..tail + first].copy_from_slice(&data[..first]);
        if rest > 0 {
            inner.data[..rest].copy_from_slice(&data[first..first + rest]);
        }
        inner.tail = (tail + to_write) % len;

        safe_assert!(inner.used() <= inner.data.len() - 1, "ring buffer overfilled past capacity - 1");
        self.cv.notify_all();
        to_write
    }

    /// Reads up to `count` bytes, blocking while the buffer is empty and
    /// open. Returns an empty vec once the buffer is empty and closed (EOF).
    pub fn read(&self, count: usize) -> Vec<u8> {
        if count == 0 {
            return Vec::new();
        }

        let mut inner = self.inner.lock().unwrap();
        inner = self.cv.wait_while(inner, |i| i.is_empty() && !i.closed).unwrap();

        if inner.is_empty() {
            return Vec::new();
        }

        let to_read = count.min(inner.used());
        let len = inner.data.len();
        let head = inner.head;
        let first = to_read.min(len - head);
        let rest = to_read - first;

        let mut out = Vec::with_capacity(to_read);
        out.extend_from_slice(&inner.data[head..head + first]);
        if rest > 0 {
            out.extend_from_slice(&inner.data[..rest]);
        }
        inner.head = (head + to_read) % len;

        safe_assert!(out.len() == to_read, "short read without a matching head advance");
        self.cv.notify_all();
        out
    }

    /// Repeatedly `write`s until every byte of `data` has been consumed or
    /// the buffer closes mid-flight, in which case the remainder is dropped.
    pub fn writeall(&self, data: &[u8]) {
        let mut offset = 0;
        while offset < data.len() {
            let n = self.write(&data[offset..]);
            if n == 0 {
                return;
            }
            offset += n;
        }
    }

    /// Repeatedly `read`s until `count` bytes are collected or EOF is
    /// observed, in which case whatever was collected so far is returned.
    pub fn readall(&self, count: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(count);
        while out.len() < count {
            let chunk = self.read(count - out.len());
            if chunk.is_empty() {
                break;
            }
            out.extend_from_slice(&chunk);
        }
        out
    }

    /// Sets the closed flag and wakes every waiter. Idempotent.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.closed = true;
        self.cv.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }
}
