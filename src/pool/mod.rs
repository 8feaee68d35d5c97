//! Reusable byte buffers for request and response bodies.
//!
//! Buffers are handed out empty with their capacity retained. Callers must not
//! assume a particular buffer instance comes back from [`BufferPool::acquire`].

use bytes::BytesMut;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Initial capacity of a freshly allocated buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 16 << 10;

/// Maximum number of idle buffers kept by a pool.
pub const DEFAULT_MAX_IDLE: usize = 64;

/// Buffers that grew beyond this capacity are dropped instead of pooled.
pub const DEFAULT_MAX_RETAINED_CAPACITY: usize = 4 << 20;

static SHARED: Lazy<Arc<BufferPool>> = Lazy::new(|| Arc::new(BufferPool::new()));

/// A pool of growable byte buffers, safe for concurrent use.
#[derive(Debug)]
pub struct BufferPool {
    idle: Mutex<Vec<BytesMut>>,
    capacity: usize,
    max_idle: usize,
    max_retained_capacity: usize,
    allocated: AtomicUsize,
}

impl BufferPool {
    /// Create a pool with the default buffer capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a pool whose new buffers start with `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            capacity,
            max_idle: DEFAULT_MAX_IDLE,
            max_retained_capacity: DEFAULT_MAX_RETAINED_CAPACITY.max(capacity),
            allocated: AtomicUsize::new(0),
        }
    }

    /// Limit the number of idle buffers kept for reuse.
    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Process-wide default pool.
    pub fn shared() -> Arc<BufferPool> {
        Arc::clone(&SHARED)
    }

    /// Take an empty buffer from the pool, allocating one if none is idle.
    pub fn acquire(&self) -> BytesMut {
        if let Some(mut buf) = self.idle.lock().pop() {
            buf.clear();
            return buf;
        }
        self.allocated.fetch_add(1, Ordering::Relaxed);
        BytesMut::with_capacity(self.capacity)
    }

    /// Return a buffer to the pool. `None` is ignored.
    pub fn release(&self, buf: Option<BytesMut>) {
        let Some(mut buf) = buf else {
            return;
        };
        if buf.capacity() > self.max_retained_capacity {
            return;
        }
        buf.clear();

        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(buf);
        }
    }

    /// Acquire a buffer that goes back to the pool when dropped.
    pub fn checkout(&self) -> PooledBuffer<'_> {
        PooledBuffer {
            pool: self,
            buf: self.acquire(),
        }
    }

    /// Number of buffers this pool has allocated so far.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Number of buffers currently waiting for reuse.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffer checked out of a [`BufferPool`], released on drop.
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: BytesMut,
}

impl Deref for PooledBuffer<'_> {
    type Target = BytesMut;

    fn deref(&self) -> &BytesMut {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(Some(std::mem::take(&mut self.buf)));
    }
}
