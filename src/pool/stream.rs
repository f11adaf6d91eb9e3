//! Buffered reader/writer wrappers whose buffers are pooled.
//!
//! The pools keep only the detached buffer. `get(source)` attaches a reader or
//! writer to a pooled buffer; `put` detaches it again, dropping the source and
//! any unread or unflushed bytes.

use super::{BoundedPool, Policy, PoolSize, PoolStats, Recycle, Ref};
use crate::config::PoolOptions;
use std::fmt;
use std::io::{self, BufRead, Read, Write};

pub const DEFAULT_BUFIO_SIZE: usize = 4 * 1024;

/// Admission for stream buffers: never smaller than `buf_size`; in strict
/// mode exactly `buf_size`.
#[derive(Debug, Clone, Copy)]
pub struct StreamPolicy {
    buf_size: usize,
    strict: bool,
}

impl StreamPolicy {
    pub fn new(buf_size: usize, strict: bool) -> Self {
        Self { buf_size, strict }
    }
}

impl Policy<Box<[u8]>> for StreamPolicy {
    fn allocate(&self) -> Box<[u8]> {
        vec![0u8; self.buf_size].into_boxed_slice()
    }

    fn admit(&self, buf: Box<[u8]>) -> Option<Box<[u8]>> {
        if buf.len() < self.buf_size {
            return None;
        }
        if self.strict && self.buf_size < buf.len() {
            return None;
        }
        Some(buf)
    }

    fn nominal_size(&self) -> usize {
        self.buf_size
    }
}

pub struct BufferedReader<R> {
    inner: Option<R>,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
}

impl<R> BufferedReader<R> {
    pub fn with_buffer(inner: R, buf: Box<[u8]>) -> Self {
        Self {
            inner: Some(inner),
            buf,
            pos: 0,
            filled: 0,
        }
    }

    /// Size of the underlying buffer.
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    /// Bytes read from the source but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.filled - self.pos
    }

    /// Attach a new source, discarding buffered bytes. Returns the old source.
    pub fn reset(&mut self, source: R) -> Option<R> {
        self.pos = 0;
        self.filled = 0;
        self.inner.replace(source)
    }

    pub fn get_ref(&self) -> Option<&R> {
        self.inner.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut R> {
        self.inner.as_mut()
    }

    fn into_buffer(self) -> Box<[u8]> {
        self.buf
    }
}

impl<R: Read> Read for BufferedReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        // Large reads with nothing buffered bypass the buffer.
        if self.pos == self.filled && out.len() >= self.buf.len() {
            return match self.inner.as_mut() {
                Some(inner) => inner.read(out),
                None => Ok(0),
            };
        }
        let n = {
            let available = self.fill_buf()?;
            let n = available.len().min(out.len());
            out[..n].copy_from_slice(&available[..n]);
            n
        };
        self.consume(n);
        Ok(n)
    }
}

impl<R: Read> BufRead for BufferedReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.filled {
            self.pos = 0;
            self.filled = match self.inner.as_mut() {
                Some(inner) => inner.read(&mut self.buf)?,
                None => 0,
            };
        }
        Ok(&self.buf[self.pos..self.filled])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.filled);
    }
}

impl<R> fmt::Debug for BufferedReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedReader")
            .field("size", &self.buf.len())
            .field("buffered", &self.buffered())
            .field("attached", &self.inner.is_some())
            .finish()
    }
}

pub struct BufferedWriter<W> {
    inner: Option<W>,
    buf: Box<[u8]>,
    len: usize,
}

impl<W> BufferedWriter<W> {
    pub fn with_buffer(inner: W, buf: Box<[u8]>) -> Self {
        Self {
            inner: Some(inner),
            buf,
            len: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.buf.len()
    }

    /// Bytes written but not yet flushed.
    pub fn buffered(&self) -> usize {
        self.len
    }

    pub fn available(&self) -> usize {
        self.buf.len() - self.len
    }

    /// Attach a new sink, discarding unflushed bytes. Returns the old sink.
    pub fn reset(&mut self, sink: W) -> Option<W> {
        self.len = 0;
        self.inner.replace(sink)
    }

    pub fn get_ref(&self) -> Option<&W> {
        self.inner.as_ref()
    }

    fn into_buffer(self) -> Box<[u8]> {
        self.buf
    }
}

impl<W: Write> BufferedWriter<W> {
    fn sink(&mut self) -> io::Result<&mut W> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no sink attached"))
    }

    fn flush_buf(&mut self) -> io::Result<()> {
        let Self { inner, buf, len } = self;
        let Some(sink) = inner.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "no sink attached"));
        };
        let mut written = 0;
        let mut result = Ok(());
        while written < *len {
            match sink.write(&buf[written..*len]) {
                Ok(0) => {
                    result = Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write buffered data",
                    ));
                    break;
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        // keep whatever the sink did not accept
        buf.copy_within(written..*len, 0);
        *len -= written;
        result
    }
}

impl<W: Write> Write for BufferedWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.available() < data.len() {
            self.flush_buf()?;
        }
        if data.len() >= self.buf.len() {
            return self.sink()?.write(data);
        }
        self.buf[self.len..self.len + data.len()].copy_from_slice(data);
        self.len += data.len();
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_buf()?;
        self.sink()?.flush()
    }
}

impl<W> fmt::Debug for BufferedWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedWriter")
            .field("size", &self.buf.len())
            .field("buffered", &self.len)
            .field("attached", &self.inner.is_some())
            .finish()
    }
}

pub struct BufioReaderPool {
    pool: BoundedPool<Box<[u8]>, StreamPolicy>,
}

impl BufioReaderPool {
    pub fn new(capacity: usize, options: &PoolOptions) -> Self {
        Self::with_size(capacity, DEFAULT_BUFIO_SIZE, options)
    }

    pub fn with_size(capacity: usize, buf_size: usize, options: &PoolOptions) -> Self {
        let policy = StreamPolicy::new(buf_size, options.strict_size);
        Self {
            pool: BoundedPool::new(capacity, policy, options),
        }
    }

    pub fn get<R: Read>(&self, source: R) -> BufferedReader<R> {
        BufferedReader::with_buffer(source, self.pool.get())
    }

    pub fn get_ref<'p, R: Read + Send + 'p>(&'p self, source: R) -> Ref<'p, BufferedReader<R>> {
        Ref::pooled(self.get(source), self)
    }

    pub fn put<R>(&self, reader: BufferedReader<R>) -> bool {
        self.pool.put(reader.into_buffer())
    }

    pub fn buf_size(&self) -> usize {
        self.pool.policy().buf_size
    }

    pub fn is_strict(&self) -> bool {
        self.pool.policy().strict
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn cap(&self) -> usize {
        self.pool.cap()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

impl<R> Recycle<BufferedReader<R>> for BufioReaderPool {
    fn put(&self, reader: BufferedReader<R>) -> bool {
        BufioReaderPool::put(self, reader)
    }
}

impl PoolSize for BufioReaderPool {
    fn len(&self) -> usize {
        BufioReaderPool::len(self)
    }

    fn cap(&self) -> usize {
        BufioReaderPool::cap(self)
    }
}

pub struct BufioWriterPool {
    pool: BoundedPool<Box<[u8]>, StreamPolicy>,
}

impl BufioWriterPool {
    pub fn new(capacity: usize, options: &PoolOptions) -> Self {
        Self::with_size(capacity, DEFAULT_BUFIO_SIZE, options)
    }

    pub fn with_size(capacity: usize, buf_size: usize, options: &PoolOptions) -> Self {
        let policy = StreamPolicy::new(buf_size, options.strict_size);
        Self {
            pool: BoundedPool::new(capacity, policy, options),
        }
    }

    pub fn get<W: Write>(&self, sink: W) -> BufferedWriter<W> {
        BufferedWriter::with_buffer(sink, self.pool.get())
    }

    pub fn get_ref<'p, W: Write + Send + 'p>(&'p self, sink: W) -> Ref<'p, BufferedWriter<W>> {
        Ref::pooled(self.get(sink), self)
    }

    /// Return the writer's buffer. Unflushed bytes are discarded.
    pub fn put<W>(&self, writer: BufferedWriter<W>) -> bool {
        self.pool.put(writer.into_buffer())
    }

    pub fn buf_size(&self) -> usize {
        self.pool.policy().buf_size
    }

    pub fn is_strict(&self) -> bool {
        self.pool.policy().strict
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn cap(&self) -> usize {
        self.pool.cap()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

impl<W> Recycle<BufferedWriter<W>> for BufioWriterPool {
    fn put(&self, writer: BufferedWriter<W>) -> bool {
        BufioWriterPool::put(self, writer)
    }
}

impl PoolSize for BufioWriterPool {
    fn len(&self) -> usize {
        BufioWriterPool::len(self)
    }

    fn cap(&self) -> usize {
        BufioWriterPool::cap(self)
    }
}
