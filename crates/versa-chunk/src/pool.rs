use bytes::BytesMut;
use parking_lot::{const_mutex, Mutex};
use std::ops::{Deref, DerefMut};

const INITIAL_CAPACITY: usize = 1024;
/// Buffers that grew past this are dropped instead of returned.
const MAX_RETAINED_CAPACITY: usize = 1 << 20;
const MAX_POOLED: usize = 64;

/// Scratch buffers shared by concurrent encoders.
pub struct BufferPool {
    buffers: Mutex<Vec<BytesMut>>,
}

static POOL: BufferPool = BufferPool::new();

/// Check a buffer out of the shared pool.
pub fn acquire() -> PooledBuffer<'static> {
    POOL.acquire()
}

impl BufferPool {
    pub const fn new() -> Self {
        Self {
            buffers: const_mutex(Vec::new()),
        }
    }

    /// The buffer is empty and goes back to the pool when the guard drops.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self
            .buffers
            .lock()
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(INITIAL_CAPACITY));
        PooledBuffer { buf, pool: self }
    }

    pub fn len(&self) -> usize {
        self.buffers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PooledBuffer<'a> {
    buf: BytesMut,
    pool: &'a BufferPool,
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
        let mut buf = std::mem::take(&mut self.buf);
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        let mut buffers = self.pool.buffers.lock();
        if buffers.len() < MAX_POOLED {
            buffers.push(buf);
        }
    }
}
