//! Reusable output buffers.

use parking_lot::Mutex;

/// Buffers that grew past this are dropped rather than pooled, so one huge
/// record does not pin memory for the life of the handler.
const MAX_RETAINED_CAPACITY: usize = 16 << 10;
const MAX_IDLE_BUFFERS: usize = 64;
const INITIAL_CAPACITY: usize = 1024;

/// A pool of byte buffers with exclusive checkout.
///
/// A buffer taken with [`BufferPool::get`] belongs to the caller alone until it
/// is handed back with [`BufferPool::put`].
#[derive(Debug, Default)]
pub struct BufferPool {
    idle: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks out an empty buffer.
    pub fn get(&self) -> Vec<u8> {
        self.idle
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(INITIAL_CAPACITY))
    }

    /// Returns a buffer to the pool. Its contents are discarded.
    pub fn put(&self, mut buf: Vec<u8>) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        let mut idle = self.idle.lock();
        if idle.len() < MAX_IDLE_BUFFERS {
            idle.push(buf);
        }
    }

    /// Number of buffers currently waiting in the pool.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }
}
